use approx::assert_abs_diff_eq;
use xtalk_util::named::NamedMatrix;
use xtalk_util::ndarray_util::*;
use xtalk_util::traits::{IoOps, SampleOps};

#[test]
fn array_tsv_round_trip() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("mat.tsv");
    let path = path.to_str().unwrap();

    let xx = Array2::<f32>::runif(7, 3);
    xx.to_tsv(path).unwrap();
    let yy = Array2::<f32>::from_tsv(path).unwrap();

    assert_eq!(xx.dim(), yy.dim());
    for (a, b) in xx.iter().zip(yy.iter()) {
        assert_abs_diff_eq!(*a, *b, epsilon = 1e-4);
    }
}

#[test]
fn named_matrix_round_trip_gz() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("named.tsv.gz");
    let path = path.to_str().unwrap();

    let values = Array2::<f32>::runif(4, 2);
    let rows: Vec<Box<str>> = vec!["g1".into(), "g2".into(), "g3".into(), "g4".into()];
    let cols: Vec<Box<str>> = vec!["c1".into(), "c2".into()];

    let mat = NamedMatrix::new(values, rows, cols).unwrap();
    mat.to_tsv(path, "gene").unwrap();

    let back = NamedMatrix::from_tsv(path).unwrap();
    assert_eq!(back.rows, mat.rows);
    assert_eq!(back.cols, mat.cols);
    for (a, b) in mat.values.iter().zip(back.values.iter()) {
        assert_abs_diff_eq!(*a, *b, epsilon = 1e-4);
    }
}

#[test]
fn named_matrix_rejects_shape_mismatch() {
    let values = ndarray::Array2::<f32>::zeros((2, 2));
    let rows: Vec<Box<str>> = vec!["a".into(), "b".into(), "c".into()];
    let cols: Vec<Box<str>> = vec!["x".into(), "y".into()];
    assert!(NamedMatrix::new(values, rows, cols).is_err());
}

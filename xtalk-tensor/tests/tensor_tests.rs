use approx::assert_abs_diff_eq;
use ndarray::prelude::*;
use xtalk_score::scoring::ContextScores;
use xtalk_tensor::tensor::{InteractionTensor, TensorJoin};

fn cube(context: &str, lr: &[&str], ct: &[&str], fill: f32) -> ContextScores {
    let lr_names: Vec<Box<str>> = lr.iter().map(|x| (*x).into()).collect();
    let cell_types: Vec<Box<str>> = ct.iter().map(|x| (*x).into()).collect();
    let scores = Array3::from_elem((lr.len(), ct.len(), ct.len()), fill);
    ContextScores::new(context.into(), lr_names, cell_types, scores).unwrap()
}

#[test]
fn inner_join_keeps_shared_labels() {
    let c0 = cube("c0", &["p1", "p2"], &["A", "B"], 1.0);
    let c1 = cube("c1", &["p2", "p3"], &["A", "B"], 2.0);

    let tt = InteractionTensor::build(&[c0, c1], TensorJoin::Inner).unwrap();
    assert_eq!(tt.dims(), [2, 1, 2, 2]);
    let expected_lr: Vec<Box<str>> = vec!["p2".into()];
    assert_eq!(tt.lr_names, expected_lr);
    assert!(tt.mask.is_none());

    assert_abs_diff_eq!(tt.data[(0, 0, 0, 0)], 1.0);
    assert_abs_diff_eq!(tt.data[(1, 0, 1, 1)], 2.0);
}

#[test]
fn outer_join_masks_missing_entries() {
    let c0 = cube("c0", &["p1"], &["A", "B"], 1.0);
    let c1 = cube("c1", &["p1", "p2"], &["A", "B"], 2.0);

    let tt = InteractionTensor::build(&[c0, c1], TensorJoin::Outer).unwrap();
    assert_eq!(tt.dims(), [2, 2, 2, 2]);

    let mask = tt.mask.as_ref().expect("outer join should carry a mask");

    // p2 was never scored in context c0
    assert_abs_diff_eq!(mask[(0, 1, 0, 0)], 0.0);
    assert_abs_diff_eq!(tt.data[(0, 1, 0, 0)], 0.0);
    // and fully observed in c1
    assert_abs_diff_eq!(mask[(1, 1, 1, 0)], 1.0);
    assert_abs_diff_eq!(tt.data[(1, 1, 1, 0)], 2.0);
}

#[test]
fn nan_scores_are_masked() {
    let mut c0 = cube("c0", &["p1"], &["A", "B"], 1.0);
    c0.scores[(0, 0, 1)] = f32::NAN;

    let tt = InteractionTensor::build(&[c0], TensorJoin::Inner).unwrap();
    let mask = tt.mask.as_ref().expect("NaN should trigger masking");
    assert_abs_diff_eq!(mask[(0, 0, 0, 1)], 0.0);
    assert_abs_diff_eq!(tt.data[(0, 0, 0, 1)], 0.0);
    assert_abs_diff_eq!(mask[(0, 0, 1, 0)], 1.0);
}

#[test]
fn duplicate_contexts_are_rejected() {
    let c0 = cube("same", &["p1"], &["A"], 1.0);
    let c1 = cube("same", &["p1"], &["A"], 2.0);
    assert!(InteractionTensor::build(&[c0, c1], TensorJoin::Outer).is_err());
}

#[test]
fn disjoint_inner_join_is_an_error() {
    let c0 = cube("c0", &["p1"], &["A"], 1.0);
    let c1 = cube("c1", &["p2"], &["A"], 2.0);
    assert!(InteractionTensor::build(&[c0, c1], TensorJoin::Inner).is_err());
}

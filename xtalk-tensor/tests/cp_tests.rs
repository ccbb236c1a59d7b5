use approx::assert_abs_diff_eq;
use ndarray::prelude::*;
use xtalk_tensor::cp::*;
use xtalk_tensor::elbow::{elbow_rank_selection, pick_elbow, ElbowPoint};
use xtalk_tensor::tensor::InteractionTensor;
use xtalk_util::ndarray_util::*;
use xtalk_util::traits::SampleOps;

fn names(prefix: &str, n: usize) -> Vec<Box<str>> {
    (0..n)
        .map(|i| format!("{}{}", prefix, i).into_boxed_str())
        .collect()
}

/// random non-negative rank-`rank` tensor wrapped as an
/// InteractionTensor with trivial labels
fn planted_tensor(dims: [usize; 4], rank: usize) -> InteractionTensor {
    assert_eq!(dims[2], dims[3]);

    let factors: Vec<Array2<f32>> = dims
        .iter()
        .map(|&d| Array2::<f32>::runif(d, rank) + 0.2)
        .collect();

    let kr = khatri_rao3(&factors[1], &factors[2], &factors[3]);
    let flat = factors[0].dot(&kr.t());
    let data = fold(&flat, 0, dims).unwrap();

    InteractionTensor {
        data,
        mask: None,
        contexts: names("ctx", dims[0]),
        lr_names: names("lr", dims[1]),
        cell_types: names("ct", dims[2]),
    }
}

#[test]
fn unfold_fold_round_trip() {
    let dims = [2, 3, 4, 4];
    let data = Array2::<f32>::runif(2, 48)
        .into_shape_with_order(dims)
        .unwrap();

    for mode in 0..4 {
        let mat = unfold(&data, mode).unwrap();
        assert_eq!(mat.nrows(), dims[mode]);
        let back = fold(&mat, mode, dims).unwrap();
        assert_eq!(back, data);
    }
}

#[test]
fn khatri_rao_ordering_matches_unfold() {
    // rank-1: unfold(outer(a,b,c,d), 0) == a * kr(b,c,d)^T
    let dims = [2, 3, 2, 2];
    let a = Array2::<f32>::runif(dims[0], 1);
    let b = Array2::<f32>::runif(dims[1], 1);
    let c = Array2::<f32>::runif(dims[2], 1);
    let d = Array2::<f32>::runif(dims[3], 1);

    let kr = khatri_rao3(&b, &c, &d);
    let flat = a.dot(&kr.t());
    let tensor = fold(&flat, 0, dims).unwrap();

    for i0 in 0..dims[0] {
        for i1 in 0..dims[1] {
            for i2 in 0..dims[2] {
                for i3 in 0..dims[3] {
                    let expect = a[(i0, 0)] * b[(i1, 0)] * c[(i2, 0)] * d[(i3, 0)];
                    assert_abs_diff_eq!(tensor[(i0, i1, i2, i3)], expect, epsilon = 1e-5);
                }
            }
        }
    }
}

#[test]
fn fold_accepts_column_major_input() {
    let dims = [2, 2, 2, 2];
    let c_major = Array2::<f32>::runif(2, 8);
    // reversing axes of the transpose gives the same values with
    // column-major strides
    let f_major = c_major.clone().reversed_axes().as_standard_layout().to_owned().reversed_axes();
    assert_eq!(c_major, f_major);

    let a = fold(&c_major, 0, dims).unwrap();
    let b = fold(&f_major, 0, dims).unwrap();
    assert_eq!(a, b);
}

#[test]
fn rank_one_fit_and_reconstruction() {
    let tensor = planted_tensor([2, 2, 2, 2], 1);

    let opts = CpOptions {
        rank: 1,
        init: CpInit::Random,
        max_iter: 500,
        tol: 1e-7,
    };
    let model = cp_decompose(&tensor, &opts).unwrap();
    assert!(model.error < 0.05, "rank-1 error {}", model.error);

    let rec = model.reconstruct(tensor.dims()).unwrap();
    assert_eq!(rec.dim(), tensor.data.dim());
}

#[test]
fn cp_recovers_planted_low_rank() {
    let tensor = planted_tensor([4, 6, 3, 3], 2);

    let opts = CpOptions {
        rank: 2,
        init: CpInit::Svd,
        max_iter: 500,
        tol: 1e-7,
    };
    let model = cp_decompose(&tensor, &opts).unwrap();

    assert!(model.error < 0.05, "error {} too large", model.error);
    assert_eq!(model.rank(), 2);
    // weights come out sorted
    for w in model.weights.windows(2) {
        assert!(w[0] >= w[1]);
    }
    // non-negative factors
    for factor in &model.factors {
        assert!(factor.iter().all(|&x| x >= 0.0));
    }
}

#[test]
fn reconstruction_matches_fit_error() {
    let tensor = planted_tensor([3, 5, 3, 3], 2);

    let opts = CpOptions {
        rank: 2,
        init: CpInit::Svd,
        max_iter: 300,
        tol: 1e-7,
    };
    let model = cp_decompose(&tensor, &opts).unwrap();
    let rec = model.reconstruct(tensor.dims()).unwrap();

    let denom = tensor.data.mapv(|x| x * x).sum().sqrt();
    let err = (&tensor.data - &rec).mapv(|x| x * x).sum().sqrt() / denom;
    assert_abs_diff_eq!(err, model.error, epsilon = 1e-3);
}

#[test]
fn masked_entries_do_not_poison_the_fit() {
    let mut tensor = planted_tensor([3, 6, 3, 3], 1);

    // hide a handful of entries behind the mask with garbage values
    let mut mask = Array4::<f32>::ones(tensor.data.raw_dim());
    for &(c, p, s, r) in &[(0, 0, 0, 0), (1, 2, 1, 2), (2, 5, 2, 0)] {
        mask[(c, p, s, r)] = 0.0;
        tensor.data[(c, p, s, r)] = 0.0;
    }
    tensor.mask = Some(mask);

    let opts = CpOptions {
        rank: 1,
        init: CpInit::Random,
        max_iter: 500,
        tol: 1e-7,
    };
    let model = cp_decompose(&tensor, &opts).unwrap();
    assert!(model.error < 0.05, "masked fit error {}", model.error);
}

#[test]
fn absurd_rank_is_rejected() {
    let tensor = planted_tensor([2, 3, 2, 2], 1);
    let opts = CpOptions {
        rank: 1000,
        ..CpOptions::default()
    };
    assert!(cp_decompose(&tensor, &opts).is_err());

    let opts = CpOptions {
        rank: 0,
        ..CpOptions::default()
    };
    assert!(cp_decompose(&tensor, &opts).is_err());
}

#[test]
fn pick_elbow_finds_the_knee() {
    let curve: Vec<ElbowPoint> = [
        (1, 1.0_f32),
        (2, 0.4),
        (3, 0.1),
        (4, 0.09),
        (5, 0.085),
    ]
    .iter()
    .map(|&(rank, error)| ElbowPoint { rank, error })
    .collect();

    assert_eq!(pick_elbow(&curve), 3);
}

#[test]
fn elbow_sweep_clamps_to_supported_rank() {
    // a 2 x 2 x 2 x 2 tensor supports rank 8 at most; the default
    // CLI max rank of 10 must not abort the sweep
    let tensor = planted_tensor([2, 2, 2, 2], 1);

    let opts = CpOptions {
        init: CpInit::Random,
        max_iter: 100,
        tol: 1e-5,
        ..CpOptions::default()
    };
    let result = elbow_rank_selection(&tensor, 10, 1, &opts).unwrap();

    assert_eq!(result.curve.len(), 8);
    assert!(result.selected_rank >= 1 && result.selected_rank <= 8);
}

#[test]
fn elbow_sweep_on_planted_rank() {
    let tensor = planted_tensor([5, 8, 4, 4], 3);

    let opts = CpOptions {
        init: CpInit::Svd,
        max_iter: 300,
        tol: 1e-6,
        ..CpOptions::default()
    };
    let result = elbow_rank_selection(&tensor, 6, 2, &opts).unwrap();

    assert_eq!(result.curve.len(), 6);
    // error never increases much along the sweep
    for w in result.curve.windows(2) {
        assert!(w[1].error <= w[0].error + 0.05);
    }
    assert!(
        (2..=4).contains(&result.selected_rank),
        "selected {}",
        result.selected_rank
    );
}

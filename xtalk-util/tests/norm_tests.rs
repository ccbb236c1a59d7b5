use approx::assert_abs_diff_eq;
use xtalk_util::ndarray_util::*;
use xtalk_util::traits::{MatOps, SampleOps};

#[test]
fn normalize_columns_to_unit_length() {
    let mut xx = Array2::<f32>::runif(100, 10) + 0.5;
    xx.normalize_columns_inplace();

    for j in 0..xx.ncols() {
        let norm = xx.column(j).dot(&xx.column(j)).sqrt();
        assert_abs_diff_eq!(norm, 1.0, epsilon = 1e-4);
    }
}

#[test]
fn scale_columns_to_zero_mean_unit_sd() {
    let mut xx = Array2::<f32>::rnorm(200, 5) * 3.0 + 7.0;
    xx.scale_columns_inplace();

    for j in 0..xx.ncols() {
        let mu = xx.column(j).mean().unwrap();
        let sd = xx.column(j).std(0.0);
        assert_abs_diff_eq!(mu, 0.0, epsilon = 1e-3);
        assert_abs_diff_eq!(sd, 1.0, epsilon = 1e-3);
    }
}

#[test]
fn grouped_stat_mean_and_fraction() {
    use ndarray::arr1;
    use xtalk_util::stat::GroupedColumnStat;

    let mut stat = GroupedColumnStat::new(3, 2);
    stat.add_column(0, arr1(&[1.0_f32, 0.0, 2.0]).view());
    stat.add_column(0, arr1(&[3.0_f32, 0.0, 0.0]).view());
    stat.add_column(1, arr1(&[0.0_f32, 5.0, 5.0]).view());

    let mean = stat.mean();
    assert_abs_diff_eq!(mean[(0, 0)], 2.0);
    assert_abs_diff_eq!(mean[(2, 0)], 1.0);
    assert_abs_diff_eq!(mean[(1, 1)], 5.0);

    let frac = stat.fraction_positive();
    assert_abs_diff_eq!(frac[(0, 0)], 1.0);
    assert_abs_diff_eq!(frac[(1, 0)], 0.0);
    assert_abs_diff_eq!(frac[(2, 0)], 0.5);
    assert_abs_diff_eq!(frac[(2, 1)], 1.0);
}

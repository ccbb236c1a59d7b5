use ndarray::prelude::*;

/// Sufficient statistics for column observations accumulated per
/// group: used to collapse a `feature x item` matrix into
/// `feature x group` summaries.
#[derive(Clone)]
pub struct GroupedColumnStat {
    npos: Array2<f32>,
    s0: Array1<f32>,
    s1: Array2<f32>,
    s2: Array2<f32>,
}

impl GroupedColumnStat {
    pub fn new(nrows: usize, ngroups: usize) -> Self {
        Self {
            npos: Array2::zeros((nrows, ngroups)),
            s0: Array1::zeros(ngroups),
            s1: Array2::zeros((nrows, ngroups)),
            s2: Array2::zeros((nrows, ngroups)),
        }
    }

    pub fn ngroups(&self) -> usize {
        self.s0.len()
    }

    pub fn add_column(&mut self, group: usize, column: ArrayView1<f32>) {
        debug_assert!(group < self.ngroups());
        self.s0[group] += 1.0;

        let mut npos_g = self.npos.column_mut(group);
        npos_g += &column.mapv(|x| if x > 0.0 { 1.0 } else { 0.0 });

        let mut s1_g = self.s1.column_mut(group);
        s1_g += &column;

        let mut s2_g = self.s2.column_mut(group);
        s2_g += &column.mapv(|x| x * x);
    }

    /// number of columns accumulated per group
    pub fn sizes(&self) -> &Array1<f32> {
        &self.s0
    }

    /// per-group mean of each feature
    pub fn mean(&self) -> Array2<f32> {
        let denom = self.s0.mapv(|n| n.max(1.0));
        &self.s1 / &denom
    }

    /// per-group fraction of columns with a positive value
    pub fn fraction_positive(&self) -> Array2<f32> {
        let denom = self.s0.mapv(|n| n.max(1.0));
        &self.npos / &denom
    }

    /// per-group variance of each feature
    pub fn variance(&self) -> Array2<f32> {
        let denom = self.s0.mapv(|n| n.max(1.0));
        let mean = self.mean();
        &self.s2 / &denom - &mean * &mean
    }

    pub fn std(&self) -> Array2<f32> {
        self.variance().mapv(|x| x.max(0.0).sqrt())
    }
}

//! Expression matrices (gene x cell) and their collapse into
//! cell-type-level profiles.

use log::info;
use ndarray::prelude::*;
use xtalk_util::membership::Membership;
use xtalk_util::named::NamedMatrix;
use xtalk_util::stat::GroupedColumnStat;
use xtalk_util::utils::partition_by_membership;

/// A gene x cell expression matrix with unique gene names.
#[derive(Clone)]
pub struct ExpressionMatrix {
    pub data: NamedMatrix,
}

impl ExpressionMatrix {
    pub fn new(data: NamedMatrix) -> anyhow::Result<Self> {
        // row_index fails on duplicate gene names
        let _ = data.row_index()?;
        Ok(Self { data })
    }

    pub fn from_tsv(file: &str) -> anyhow::Result<Self> {
        let data = NamedMatrix::from_tsv(file)?;
        info!(
            "expression: {} genes x {} cells from {}",
            data.nrows(),
            data.ncols(),
            file
        );
        Self::new(data)
    }

    pub fn genes(&self) -> &[Box<str>] {
        &self.data.rows
    }

    pub fn cells(&self) -> &[Box<str>] {
        &self.data.cols
    }
}

/// How to derive per-gene expression thresholds for binarization.
///
/// The original pipeline raises an error for an unrecognized cutoff
/// method; here the enum makes that unrepresentable, but quantiles
/// outside `[0,1]` are still rejected.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CutoffKind {
    /// the same fixed threshold for every gene
    Fixed(f32),
    /// one global quantile of all expression values
    GlobalQuantile(f32),
    /// a per-gene quantile across cells
    GeneQuantile(f32),
}

impl CutoffKind {
    /// One threshold per gene (row) of `data`.
    pub fn thresholds(&self, data: &Array2<f32>) -> anyhow::Result<Array1<f32>> {
        match *self {
            CutoffKind::Fixed(value) => {
                if !value.is_finite() {
                    anyhow::bail!("non-finite cutoff value");
                }
                Ok(Array1::from_elem(data.nrows(), value))
            }
            CutoffKind::GlobalQuantile(qq) => {
                let mut all: Vec<f32> = data.iter().copied().collect();
                let value = quantile(&mut all, qq)?;
                Ok(Array1::from_elem(data.nrows(), value))
            }
            CutoffKind::GeneQuantile(qq) => {
                let mut out = Array1::zeros(data.nrows());
                for (i, row) in data.rows().into_iter().enumerate() {
                    let mut vals: Vec<f32> = row.iter().copied().collect();
                    out[i] = quantile(&mut vals, qq)?;
                }
                Ok(out)
            }
        }
    }
}

/// Empirical quantile with linear interpolation; sorts in place.
fn quantile(values: &mut [f32], qq: f32) -> anyhow::Result<f32> {
    if !(0.0..=1.0).contains(&qq) {
        anyhow::bail!("quantile {} outside [0,1]", qq);
    }
    if values.is_empty() {
        anyhow::bail!("no values to take a quantile of");
    }

    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let pos = qq * (values.len() - 1) as f32;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f32;
    Ok(values[lo] * (1.0 - frac) + values[hi] * frac)
}

/// `1` where `data[i,j] > thresholds[i]`, `0` otherwise
pub fn binarize(data: &Array2<f32>, thresholds: &Array1<f32>) -> Array2<f32> {
    let mut out = data.clone();
    for (i, mut row) in out.rows_mut().into_iter().enumerate() {
        let tt = thresholds[i];
        row.mapv_inplace(|x| if x > tt { 1.0 } else { 0.0 });
    }
    out
}

/// Cell-type-level summaries of an expression matrix: mean
/// expression, fraction of expressing cells, and a binarized mean
/// profile (all gene x cell type).
#[derive(Clone)]
pub struct TypeProfiles {
    pub mean: NamedMatrix,
    pub fraction: NamedMatrix,
    pub binary: NamedMatrix,
}

impl TypeProfiles {
    pub fn cell_types(&self) -> &[Box<str>] {
        &self.mean.cols
    }

    pub fn genes(&self) -> &[Box<str>] {
        &self.mean.rows
    }
}

///
/// Collapse a gene x cell matrix into gene x cell type profiles.
/// Every cell must carry a membership record; thresholds for the
/// binary profile are derived from the raw matrix by `cutoff`.
///
pub fn aggregate_by_type(
    expr: &ExpressionMatrix,
    membership: &Membership,
    cutoff: &CutoffKind,
) -> anyhow::Result<TypeProfiles> {
    let labels = membership.assign(expr.cells())?;
    let groups = partition_by_membership(&labels, None);

    let mut cell_types: Vec<Box<str>> = groups.keys().cloned().collect();
    cell_types.sort();

    let ngenes = expr.data.nrows();
    let mut stat = GroupedColumnStat::new(ngenes, cell_types.len());

    for (k, ct) in cell_types.iter().enumerate() {
        let members = &groups[ct];
        if members.is_empty() {
            anyhow::bail!("cell type {} has no cells", ct);
        }
        for &j in members {
            stat.add_column(k, expr.data.values.column(j));
        }
    }

    info!(
        "collapsed {} cells into {} cell types",
        expr.data.ncols(),
        cell_types.len()
    );

    let thresholds = cutoff.thresholds(&expr.data.values)?;
    let mean = stat.mean();
    let binary = binarize(&mean, &thresholds);

    let genes = expr.genes().to_vec();
    Ok(TypeProfiles {
        mean: NamedMatrix::new(mean, genes.clone(), cell_types.clone())?,
        fraction: NamedMatrix::new(stat.fraction_positive(), genes.clone(), cell_types.clone())?,
        binary: NamedMatrix::new(binary, genes, cell_types)?,
    })
}

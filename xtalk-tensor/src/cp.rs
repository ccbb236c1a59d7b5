//! Non-negative CP decomposition of the communication tensor by
//! multiplicative alternating updates on mode unfoldings.

use crate::tensor::InteractionTensor;

use log::info;
use ndarray::prelude::*;
use xtalk_util::rsvd::RandomizedSVD;
use xtalk_util::traits::SampleOps;

const UPDATE_EPS: f32 = 1e-12;

/// Factor initialization. `Svd` can exhaust memory on very large
/// tensors; `Random` is the documented fallback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CpInit {
    Svd,
    Random,
}

impl std::str::FromStr for CpInit {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "svd" => Ok(Self::Svd),
            "random" => Ok(Self::Random),
            _ => Err(anyhow::anyhow!("unknown init: {}", s)),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CpOptions {
    pub rank: usize,
    pub init: CpInit,
    pub max_iter: usize,
    pub tol: f32,
}

impl Default for CpOptions {
    fn default() -> Self {
        Self {
            rank: 2,
            init: CpInit::Svd,
            max_iter: 200,
            tol: 1e-5,
        }
    }
}

/// A fitted rank-R model: one `dim x R` non-negative factor per mode
/// and per-component weights absorbed from factor column norms.
#[derive(Clone)]
pub struct CpModel {
    pub weights: Array1<f32>,
    pub factors: Vec<Array2<f32>>,
    pub error: f32,
    pub iterations: usize,
    pub converged: bool,
}

impl CpModel {
    pub fn rank(&self) -> usize {
        self.weights.len()
    }

    /// Dense reconstruction `X̂` from weights and factors
    pub fn reconstruct(&self, dims: [usize; 4]) -> anyhow::Result<Array4<f32>> {
        let weighted = {
            let mut a0 = self.factors[0].clone();
            for (j, &w) in self.weights.iter().enumerate() {
                a0.column_mut(j).mapv_inplace(|x| x * w);
            }
            a0
        };

        let kr = khatri_rao3(&self.factors[1], &self.factors[2], &self.factors[3]);
        let flat = weighted.dot(&kr.t());
        fold(&flat, 0, dims)
    }
}

///
/// Fit a non-negative CP model. Masked (unobserved) entries are
/// imputed with the running reconstruction before every sweep, so
/// they neither attract nor repel the factors.
///
pub fn cp_decompose(tensor: &InteractionTensor, opts: &CpOptions) -> anyhow::Result<CpModel> {
    let dims = tensor.dims();

    if opts.rank < 1 {
        anyhow::bail!("rank must be at least 1");
    }
    let max_rank = max_supported_rank(dims);
    if opts.rank > max_rank {
        anyhow::bail!("rank {} exceeds what {} x {} x {} x {} supports",
            opts.rank, dims[0], dims[1], dims[2], dims[3]);
    }

    let denom = tensor.norm();
    if denom <= 0.0 {
        anyhow::bail!("tensor norm is zero");
    }

    let mut factors = initialize(&tensor.data, dims, opts)?;
    let mut err_prev = f32::INFINITY;
    let mut err = f32::INFINITY;
    let mut iterations = 0;
    let mut converged = false;

    let mut work = tensor.data.clone();

    for it in 0..opts.max_iter {
        iterations = it + 1;

        // EM-style imputation of unobserved entries
        if let Some(mask) = &tensor.mask {
            let rec = reconstruct_ones(&factors, dims)?;
            work = &tensor.data * mask + &rec * &mask.mapv(|m| 1.0 - m);
        }

        for mode in 0..4 {
            let unfolded = unfold(&work, mode)?;
            let kr = kr_excluding(&factors, mode);

            let numer = unfolded.dot(&kr);

            let mut gram = Array2::<f32>::ones((opts.rank, opts.rank));
            for (m, factor) in factors.iter().enumerate() {
                if m != mode {
                    gram = gram * factor.t().dot(factor);
                }
            }

            let denom_m = factors[mode].dot(&gram) + UPDATE_EPS;
            let updated = &factors[mode] * &(numer / denom_m);
            factors[mode] = updated;
        }

        err = relative_error(tensor, &factors, dims)?;

        if (err_prev - err).abs() < opts.tol * err_prev.max(UPDATE_EPS) {
            converged = true;
            break;
        }
        err_prev = err;
    }

    info!(
        "cp rank {}: error {:.4e} after {} iterations (converged: {})",
        opts.rank, err, iterations, converged
    );

    Ok(normalize_model(factors, err, iterations, converged))
}

/// Largest rank every mode unfolding can carry: the number of columns
/// of the widest unfolding.
pub fn max_supported_rank(dims: [usize; 4]) -> usize {
    let largest = dims.iter().copied().max().unwrap_or(1).max(1);
    dims.iter().product::<usize>() / largest
}

fn initialize(
    data: &Array4<f32>,
    dims: [usize; 4],
    opts: &CpOptions,
) -> anyhow::Result<Vec<Array2<f32>>> {
    let mut factors = Vec::with_capacity(4);

    match opts.init {
        CpInit::Random => {
            for &d in dims.iter() {
                factors.push(Array2::<f32>::runif(d, opts.rank) + 0.1);
            }
        }
        CpInit::Svd => {
            for mode in 0..4 {
                let unfolded = unfold(data, mode)?;
                let kk = opts.rank.min(unfolded.nrows()).min(unfolded.ncols());

                let mut svd = RandomizedSVD::new(kk, 5);
                svd.compute(&unfolded)?;

                // non-negative seed from singular vector magnitudes,
                // padded with random columns when rank exceeds the
                // numerical rank of the unfolding
                let mut factor = Array2::<f32>::runif(dims[mode], opts.rank) * 0.01 + 0.01;
                let uu = svd.matrix_u().mapv(f32::abs);
                let kk = kk.min(uu.ncols());
                factor
                    .slice_mut(s![.., 0..kk])
                    .assign(&uu.slice(s![.., 0..kk]));
                factors.push(factor);
            }
        }
    }

    Ok(factors)
}

/// reconstruction with unit weights, used during fitting
fn reconstruct_ones(factors: &[Array2<f32>], dims: [usize; 4]) -> anyhow::Result<Array4<f32>> {
    let kr = khatri_rao3(&factors[1], &factors[2], &factors[3]);
    let flat = factors[0].dot(&kr.t());
    fold(&flat, 0, dims)
}

fn relative_error(
    tensor: &InteractionTensor,
    factors: &[Array2<f32>],
    dims: [usize; 4],
) -> anyhow::Result<f32> {
    let rec = reconstruct_ones(factors, dims)?;
    let resid = &tensor.data - &rec;

    let (num, den) = match &tensor.mask {
        Some(mask) => (
            (&resid * &resid * mask).sum(),
            (&tensor.data * &tensor.data * mask).sum(),
        ),
        None => (
            (&resid * &resid).sum(),
            (&tensor.data * &tensor.data).sum(),
        ),
    };

    if den <= 0.0 {
        anyhow::bail!("tensor norm is zero");
    }
    Ok((num / den).sqrt())
}

/// Move factor column norms into the weight vector, largest
/// component first.
fn normalize_model(
    mut factors: Vec<Array2<f32>>,
    error: f32,
    iterations: usize,
    converged: bool,
) -> CpModel {
    let rank = factors[0].ncols();
    let mut weights = Array1::<f32>::ones(rank);

    for factor in factors.iter_mut() {
        for j in 0..rank {
            let norm = factor.column(j).dot(&factor.column(j)).sqrt();
            if norm > 0.0 {
                factor.column_mut(j).mapv_inplace(|x| x / norm);
                weights[j] *= norm;
            } else {
                weights[j] = 0.0;
            }
        }
    }

    let mut order: Vec<usize> = (0..rank).collect();
    order.sort_by(|&i, &j| {
        weights[j]
            .partial_cmp(&weights[i])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let weights = Array1::from_iter(order.iter().map(|&j| weights[j]));
    let factors = factors
        .into_iter()
        .map(|factor| {
            let mut out = Array2::<f32>::zeros(factor.dim());
            for (to, &from) in order.iter().enumerate() {
                out.column_mut(to).assign(&factor.column(from));
            }
            out
        })
        .collect();

    CpModel {
        weights,
        factors,
        error,
        iterations,
        converged,
    }
}

/// mode-n matricization; columns run over the remaining modes in
/// increasing order, row-major
pub fn unfold(xx: &Array4<f32>, mode: usize) -> anyhow::Result<Array2<f32>> {
    let dims = xx.shape().to_vec();
    let order = permutation(mode);

    let perm = xx.view().permuted_axes(order);
    let std = perm.as_standard_layout().to_owned();

    let nn = dims[mode];
    let mm = xx.len() / nn;
    Ok(std.into_shape_with_order((nn, mm))?)
}

/// inverse of [`unfold`]
pub fn fold(mat: &Array2<f32>, mode: usize, dims: [usize; 4]) -> anyhow::Result<Array4<f32>> {
    let order = permutation(mode);
    let permuted_dims = [
        dims[order[0]],
        dims[order[1]],
        dims[order[2]],
        dims[order[3]],
    ];

    // matrix products can come out column-major; reshape needs row-major
    let tt = mat
        .as_standard_layout()
        .into_owned()
        .into_shape_with_order(permuted_dims)?;
    let inv = inverse_permutation(order);
    Ok(tt.permuted_axes(inv).as_standard_layout().to_owned())
}

fn permutation(mode: usize) -> [usize; 4] {
    let mut order = [mode, 0, 0, 0];
    let mut k = 1;
    for m in 0..4 {
        if m != mode {
            order[k] = m;
            k += 1;
        }
    }
    order
}

fn inverse_permutation(order: [usize; 4]) -> [usize; 4] {
    let mut inv = [0_usize; 4];
    for (i, &o) in order.iter().enumerate() {
        inv[o] = i;
    }
    inv
}

/// Khatri-Rao (column-wise Kronecker) product; the leftmost factor
/// varies slowest, matching [`unfold`]'s column order.
pub fn khatri_rao(aa: &Array2<f32>, bb: &Array2<f32>) -> Array2<f32> {
    debug_assert_eq!(aa.ncols(), bb.ncols());
    let rank = aa.ncols();
    let mut out = Array2::<f32>::zeros((aa.nrows() * bb.nrows(), rank));

    for i in 0..aa.nrows() {
        for j in 0..bb.nrows() {
            let row = i * bb.nrows() + j;
            for k in 0..rank {
                out[(row, k)] = aa[(i, k)] * bb[(j, k)];
            }
        }
    }
    out
}

pub fn khatri_rao3(aa: &Array2<f32>, bb: &Array2<f32>, cc: &Array2<f32>) -> Array2<f32> {
    khatri_rao(&khatri_rao(aa, bb), cc)
}

fn kr_excluding(factors: &[Array2<f32>], mode: usize) -> Array2<f32> {
    let others: Vec<&Array2<f32>> = (0..4).filter(|&m| m != mode).map(|m| &factors[m]).collect();
    khatri_rao(&khatri_rao(others[0], others[1]), others[2])
}

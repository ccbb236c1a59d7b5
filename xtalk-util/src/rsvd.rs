use crate::traits::SampleOps;
use ndarray::prelude::*;

/// Randomized truncated SVD
///
/// Subspace iteration in the spirit of Alg 4.4 of Halko et al. (2009),
/// self-contained: orthonormalization by modified Gram-Schmidt and the
/// small projected eigen-problem solved by cyclic Jacobi sweeps, so no
/// external LAPACK provider is required.
pub struct RandomizedSVD {
    max_rank: usize,
    iter: usize,
    u_vectors: Array2<f32>,
    singular_values: Array1<f32>,
    v_vectors: Array2<f32>,
    verbose: bool,
}

impl RandomizedSVD {
    pub fn new(max_rank: usize, iter: usize) -> Self {
        Self {
            max_rank,
            iter,
            u_vectors: Array2::zeros((0, 0)),
            singular_values: Array1::zeros(0),
            v_vectors: Array2::zeros((0, 0)),
            verbose: false,
        }
    }

    pub fn matrix_u(&self) -> &Array2<f32> {
        &self.u_vectors
    }

    pub fn matrix_v(&self) -> &Array2<f32> {
        &self.v_vectors
    }

    pub fn singular_values(&self) -> &Array1<f32> {
        &self.singular_values
    }

    pub fn set_verbose(&mut self) {
        self.verbose = true;
    }

    pub fn compute(&mut self, xx: &Array2<f32>) -> anyhow::Result<()> {
        let nr = xx.nrows();
        let nc = xx.ncols();

        if nr == 0 || nc == 0 {
            anyhow::bail!("empty matrix in randomized SVD");
        }

        let mut rank = nr.min(nc);
        let mut oversample = 0;

        if self.max_rank > 0 && rank > self.max_rank {
            rank = self.max_rank;
            oversample = 5;
        }

        let kk = (rank + oversample).min(nr.min(nc));

        // range finder with re-orthonormalized power iterations; the
        // basis shrinks to the numerical rank as collapsed columns
        // are dropped
        let mut qq = orthonormalize(&xx.dot(&Array2::<f32>::runif(nc, kk)));
        for i in 0..self.iter {
            if self.verbose {
                eprintln!("[rsvd] subspace iteration {:>4}", i + 1);
            }
            let proj = orthonormalize(&xx.t().dot(&qq));
            qq = orthonormalize(&xx.dot(&proj));
        }

        if qq.ncols() == 0 {
            anyhow::bail!("matrix has no numerical rank");
        }

        // project and solve the small symmetric problem
        let bb = qq.t().dot(xx);
        let gram = bb.dot(&bb.t());
        let (evals, evecs) = jacobi_eigh(&gram, 100, 1e-10);

        let rank = rank.min(qq.ncols());
        let mut uu = Array2::<f32>::zeros((nr, rank));
        let mut vv = Array2::<f32>::zeros((nc, rank));
        let mut dd = Array1::<f32>::zeros(rank);

        for k in 0..rank {
            let sigma = evals[k].max(0.0).sqrt();
            dd[k] = sigma;

            let w_k = evecs.column(k);
            uu.column_mut(k).assign(&qq.dot(&w_k));

            if sigma > 0.0 {
                let v_k = bb.t().dot(&w_k) / sigma;
                vv.column_mut(k).assign(&v_k);
            }
        }

        self.u_vectors = uu;
        self.singular_values = dd;
        self.v_vectors = vv;

        if self.verbose {
            eprintln!("[rsvd] done, rank {}", rank);
        }
        Ok(())
    }
}

/// Orthonormalize columns by modified Gram-Schmidt with
/// re-orthogonalization. Columns whose residual falls below the
/// numerical-rank tolerance are dropped, so the result may have fewer
/// columns than the input.
pub fn orthonormalize(xx: &Array2<f32>) -> Array2<f32> {
    let tol = f32::EPSILON.sqrt();
    let mut kept: Vec<Array1<f32>> = Vec::with_capacity(xx.ncols());

    for j in 0..xx.ncols() {
        let mut v_j = xx.column(j).to_owned();
        let scale = v_j.dot(&v_j).sqrt();
        if scale <= 0.0 {
            continue;
        }

        // twice is enough in single precision
        for _ in 0..2 {
            for q_i in kept.iter() {
                let r_ij = q_i.dot(&v_j);
                v_j.scaled_add(-r_ij, q_i);
            }
        }

        let norm = v_j.dot(&v_j).sqrt();
        if norm > tol * scale {
            kept.push(v_j / norm);
        }
    }

    let mut qq = Array2::<f32>::zeros((xx.nrows(), kept.len()));
    for (j, q_j) in kept.iter().enumerate() {
        qq.column_mut(j).assign(q_j);
    }
    qq
}

/// Eigen-decomposition of a small symmetric matrix by cyclic Jacobi
/// rotations. Returns eigenvalues in descending order with matching
/// eigenvector columns.
pub fn jacobi_eigh(aa: &Array2<f32>, max_sweeps: usize, tol: f64) -> (Array1<f32>, Array2<f32>) {
    let nn = aa.nrows();
    debug_assert_eq!(nn, aa.ncols(), "symmetric matrix expected");

    let mut a: Array2<f64> = aa.mapv(|x| x as f64);
    let mut v: Array2<f64> = Array2::eye(nn);

    for _sweep in 0..max_sweeps {
        let mut off = 0.0_f64;
        for p in 0..nn {
            for q in (p + 1)..nn {
                off += a[(p, q)] * a[(p, q)];
            }
        }
        if off.sqrt() < tol {
            break;
        }

        for p in 0..nn {
            for q in (p + 1)..nn {
                let apq = a[(p, q)];
                if apq.abs() < f64::EPSILON {
                    continue;
                }
                let app = a[(p, p)];
                let aqq = a[(q, q)];

                let theta = (aqq - app) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..nn {
                    let akp = a[(k, p)];
                    let akq = a[(k, q)];
                    a[(k, p)] = c * akp - s * akq;
                    a[(k, q)] = s * akp + c * akq;
                }
                for k in 0..nn {
                    let apk = a[(p, k)];
                    let aqk = a[(q, k)];
                    a[(p, k)] = c * apk - s * aqk;
                    a[(q, k)] = s * apk + c * aqk;
                }
                for k in 0..nn {
                    let vkp = v[(k, p)];
                    let vkq = v[(k, q)];
                    v[(k, p)] = c * vkp - s * vkq;
                    v[(k, q)] = s * vkp + c * vkq;
                }
            }
        }
    }

    let mut order: Vec<usize> = (0..nn).collect();
    order.sort_by(|&i, &j| {
        a[(j, j)]
            .partial_cmp(&a[(i, i)])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut evals = Array1::<f32>::zeros(nn);
    let mut evecs = Array2::<f32>::zeros((nn, nn));
    for (out, &k) in order.iter().enumerate() {
        evals[out] = a[(k, k)] as f32;
        evecs
            .column_mut(out)
            .assign(&v.column(k).mapv(|x| x as f32));
    }

    (evals, evecs)
}

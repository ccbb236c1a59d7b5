pub use ndarray::prelude::*;
pub use rayon::prelude::*;

use crate::common_io::{read_lines_of_words, write_lines};
use crate::traits::*;

use ndarray_rand::rand::prelude::*;
use ndarray_rand::rand_distr::{Distribution, Gamma, StandardNormal, Uniform};
use num_traits::{Float, FromPrimitive};

impl SampleOps for Array2<f32> {
    type Mat = Self;
    type Scalar = f32;

    fn runif(dd: usize, nn: usize) -> Self::Mat {
        let u01 = Uniform::new(0_f32, 1_f32);

        let rvec: Vec<f32> = (0..(dd * nn))
            .into_par_iter()
            .map_init(thread_rng, |rng, _| rng.sample(u01))
            .collect();

        Array2::from_shape_vec((dd, nn), rvec).unwrap()
    }

    fn rnorm(dd: usize, nn: usize) -> Self::Mat {
        let rvec: Vec<f32> = (0..(dd * nn))
            .into_par_iter()
            .map_init(thread_rng, |rng, _| rng.sample(StandardNormal))
            .collect();

        Array2::from_shape_vec((dd, nn), rvec).unwrap()
    }

    fn rgamma(dd: usize, nn: usize, param: (f32, f32)) -> Self::Mat {
        let (shape, scale) = param;
        let pdf = Gamma::new(shape, scale).expect("invalid gamma parameters");

        let rvec: Vec<f32> = (0..(dd * nn))
            .into_par_iter()
            .map_init(thread_rng, |rng, _| pdf.sample(rng))
            .collect();

        Array2::from_shape_vec((dd, nn), rvec).unwrap()
    }
}

impl<T> MatOps for Array2<T>
where
    T: Float + FromPrimitive,
{
    type Mat = Self;
    type Scalar = T;

    fn normalize_columns(&self) -> Self::Mat {
        let mut xx = self.clone();
        xx.normalize_columns_inplace();
        xx
    }

    fn normalize_columns_inplace(&mut self) {
        for j in 0..self.ncols() {
            let mut x_j = self.column_mut(j);
            let denom = x_j.mapv(|x| x * x).sum().max(T::one()).sqrt();
            x_j.mapv_inplace(|x| x / denom);
        }
    }

    fn scale_columns_inplace(&mut self) {
        let mu = self.mean_axis(Axis(0)).expect("mean failed");
        let sig = self.std_axis(Axis(0), T::zero());

        for j in 0..self.ncols() {
            if sig[j] > T::zero() {
                self.column_mut(j).mapv_inplace(|x| (x - mu[j]) / sig[j]);
            } else {
                self.column_mut(j).mapv_inplace(|x| x - mu[j]);
            }
        }
    }

    fn centre_columns_inplace(&mut self) {
        let mu = self.mean_axis(Axis(0)).expect("mean failed");
        for j in 0..self.ncols() {
            self.column_mut(j).mapv_inplace(|x| x - mu[j]);
        }
    }
}

impl IoOps for Array2<f32> {
    type Scalar = f32;
    type Mat = Self;

    fn read_file_delim(file: &str, delim: char, with_header: bool) -> anyhow::Result<Self::Mat> {
        let words = read_lines_of_words(file, delim, with_header)?;

        if words.lines.is_empty() {
            anyhow::bail!("no data in {}", file);
        }

        let nrows = words.lines.len();
        let ncols = words.lines[0].len();

        let mut data = Vec::with_capacity(nrows * ncols);
        for (i, line) in words.lines.iter().enumerate() {
            if line.len() != ncols {
                anyhow::bail!("ragged row {} in {}", i, file);
            }
            for w in line.iter() {
                data.push(w.parse::<f32>()?);
            }
        }

        Ok(Array2::from_shape_vec((nrows, ncols), data)?)
    }

    fn write_file_delim(&self, file: &str, delim: &str) -> anyhow::Result<()> {
        let lines: Vec<Box<str>> = self
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .map(|x| format!("{}", *x))
                    .collect::<Vec<String>>()
                    .join(delim)
                    .into_boxed_str()
            })
            .collect();
        write_lines(&lines, file)?;
        Ok(())
    }
}

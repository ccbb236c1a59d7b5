/// Normalize or scale columns in place or by copy
pub trait MatOps {
    type Mat;
    type Scalar;

    fn normalize_columns_inplace(&mut self);
    fn normalize_columns(&self) -> Self::Mat;
    fn scale_columns_inplace(&mut self);
    fn centre_columns_inplace(&mut self);
}

/// Sample random matrices
pub trait SampleOps {
    type Mat;
    type Scalar;

    /// Sample a matrix from a uniform distribution `U(0,1)`
    fn runif(dd: usize, nn: usize) -> Self::Mat;

    /// Sample a matrix from a normal distribution `N(0,1)`
    fn rnorm(dd: usize, nn: usize) -> Self::Mat;

    /// Sample a matrix from a gamma distribution with `param`
    /// `(shape α, scale θ)`
    fn rgamma(dd: usize, nn: usize, param: (f32, f32)) -> Self::Mat;
}

/// Read and write matrices from and to delimited files
pub trait IoOps {
    type Scalar;
    type Mat;

    fn read_file_delim(file: &str, delim: char, with_header: bool) -> anyhow::Result<Self::Mat>;

    fn from_tsv(tsv_file: &str) -> anyhow::Result<Self::Mat> {
        Self::read_file_delim(tsv_file, '\t', false)
    }

    fn write_file_delim(&self, file: &str, delim: &str) -> anyhow::Result<()>;

    fn to_tsv(&self, tsv_file: &str) -> anyhow::Result<()> {
        self.write_file_delim(tsv_file, "\t")
    }
}

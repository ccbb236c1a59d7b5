pub mod common_io;
pub mod membership;
pub mod named;
pub mod ndarray_util;
pub mod parquet;
pub mod rsvd;
pub mod stat;
pub mod traits;
pub mod utils;

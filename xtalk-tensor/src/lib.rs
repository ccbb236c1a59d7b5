pub mod cp;
pub mod elbow;
pub mod export;
pub mod tensor;

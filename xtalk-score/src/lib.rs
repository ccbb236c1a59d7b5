pub mod expression;
pub mod interaction_space;
pub mod lr_pairs;
pub mod scoring;

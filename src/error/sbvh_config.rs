use thiserror::Error;

/// Specific error type for `SbvhConfig` validation.
#[derive(Error, Debug)]
pub enum SbvhConfigError {
    #[error("Leaf size must be at least 1, got: {leaf_size}")]
    InvalidLeafSize { leaf_size: usize },

    #[error("Object-split bucket count must be at least 2, got: {n_buckets}")]
    InvalidBucketCount { n_buckets: usize },

    #[error("Spatial-split bin count must be at least 2, got: {n_bins}")]
    InvalidBinCount { n_bins: usize },

    #[error("Split alpha must be a finite value in [0, 1], got: {split_alpha}")]
    InvalidSplitAlpha { split_alpha: String },
}

//! Hierarchy construction configuration structure.

use nalgebra::RealField;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{fs, path::Path};

use crate::{
    config::{DEFAULT_LEAF_SIZE, DEFAULT_N_BINS, DEFAULT_N_BUCKETS, DEFAULT_SPLIT_ALPHA},
    error::{Result, SbvhConfigError},
    sbvh::CostHeuristic,
};

/// Configuration structure for constructing a split bounding volume hierarchy (`Sbvh`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SbvhConfig<T: RealField + Copy> {
    /// Scoring function used to rank candidate splits.
    pub cost_heuristic: CostHeuristic,
    /// Spatial splits are attempted when the ratio of the object split's
    /// overlap area to the root area exceeds this threshold: 0 always
    /// attempts them, 1 disables them.
    pub split_alpha: T,
    /// Maximum number of primitive references per leaf before splitting.
    pub leaf_size: usize,
    /// Number of centroid buckets used by the object-split finder.
    pub n_buckets: usize,
    /// Number of spatial bins used by the spatial-split finder.
    pub n_bins: usize,
    /// Prefer larger leaves when the split cost plateaus.
    pub pack_leaves: bool,
    /// Log construction statistics when the build completes.
    pub print_stats: bool,
}

impl<T: RealField + Copy> SbvhConfig<T> {
    /// Construct a new `SbvhConfig` instance.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is outside its documented range.
    pub fn new(
        cost_heuristic: CostHeuristic,
        split_alpha: T,
        leaf_size: usize,
        n_buckets: usize,
        n_bins: usize,
        pack_leaves: bool,
        print_stats: bool,
    ) -> Result<Self> {
        let config = Self {
            cost_heuristic,
            split_alpha,
            leaf_size,
            n_buckets,
            n_bins,
            pack_leaves,
            print_stats,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check every parameter against its documented range.
    fn validate(&self) -> Result<()> {
        if self.leaf_size < 1 {
            return Err(SbvhConfigError::InvalidLeafSize {
                leaf_size: self.leaf_size,
            }
            .into());
        }
        if self.n_buckets < 2 {
            return Err(SbvhConfigError::InvalidBucketCount {
                n_buckets: self.n_buckets,
            }
            .into());
        }
        if self.n_bins < 2 {
            return Err(SbvhConfigError::InvalidBinCount { n_bins: self.n_bins }.into());
        }
        if !self.split_alpha.is_finite() || self.split_alpha < T::zero() || self.split_alpha > T::one() {
            return Err(SbvhConfigError::InvalidSplitAlpha {
                split_alpha: self.split_alpha.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl<T: RealField + Copy + Serialize + DeserializeOwned> SbvhConfig<T> {
    /// Serialize the configuration to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize a configuration from a JSON string, re-checking every
    /// parameter range; hand-edited files get the same validation as `new`.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or a parameter is outside its
    /// documented range.
    pub fn from_json(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration to the given file path (overwrites if exists).
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized or the file
    /// cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load a configuration from the given file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the contents are not
    /// valid JSON, or a parameter is outside its documented range.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

impl<T: RealField + Copy> Default for SbvhConfig<T> {
    /// Surface area heuristic with the conventional bucket and bin counts.
    ///
    /// # Panics
    ///
    /// In practice this method will never panic.
    fn default() -> Self {
        Self {
            cost_heuristic: CostHeuristic::default(),
            split_alpha: T::from_f64(DEFAULT_SPLIT_ALPHA).unwrap(),
            leaf_size: DEFAULT_LEAF_SIZE,
            n_buckets: DEFAULT_N_BUCKETS,
            n_bins: DEFAULT_N_BINS,
            pack_leaves: false,
            print_stats: false,
        }
    }
}

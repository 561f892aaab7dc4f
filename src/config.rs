/// Maximum depth of the `Sbvh`; bounds both construction recursion and traversal scratch.
pub const SBVH_MAX_DEPTH: usize = 64;
/// Capacity of the fixed traversal stack used by `Sbvh` queries.
pub const TRAVERSAL_STACK_SIZE: usize = 2 * SBVH_MAX_DEPTH;
/// Ratio of overlap area to root area above which a spatial split is attempted.
pub const DEFAULT_SPLIT_ALPHA: f64 = 1e-5;
/// Maximum number of primitive references per leaf before splitting.
pub const DEFAULT_LEAF_SIZE: usize = 4;
/// Number of centroid buckets used by the object-split finder.
pub const DEFAULT_N_BUCKETS: usize = 8;
/// Number of spatial bins used by the spatial-split finder.
pub const DEFAULT_N_BINS: usize = 8;
/// Distance tolerance under which two interactions with the same primitive are duplicates.
pub const INTERACTION_DISTANCE_EPSILON: f64 = 1e-6;

use thiserror::Error;

/// Specific error type for `Sbvh` construction.
#[derive(Debug, Clone, Copy, Error)]
pub enum SbvhError {
    #[error("Primitive reference range exceeds the 32-bit node layout: {count} references.")]
    ReferenceRangeOverflow { count: usize },
    #[error("Child offset exceeds the 32-bit node layout: {offset}.")]
    ChildOffsetOverflow { offset: usize },
}

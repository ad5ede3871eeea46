//! Error types for the diff crate.

/// Errors that can occur while applying a patch.
///
/// Lenient application never fails; these are only produced when a
/// [`PatchConfig`](crate::PatchConfig) asks for strict handling.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiffError {
    /// A targeted instruction found no index, key, tag or branch to act on.
    #[error("{instruction} instruction in {container} patch has no target")]
    MissingTarget {
        container: &'static str,
        instruction: &'static str,
    },
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;

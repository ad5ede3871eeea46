use thiserror::Error;

use crate::tag::TagId;

/// Errors produced by typed [`Context`](crate::Context) lookups.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("service not found: {0}")]
    ServiceNotFound(TagId),

    #[error("service bound to {tag} is not a {expected}")]
    ServiceTypeMismatch { tag: TagId, expected: &'static str },
}

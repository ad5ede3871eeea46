//! Foundation value types for patchwork.
//!
//! The diff algebra in `patchwork-diff` is instantiated over persistent
//! containers. Sequences, hashed maps and hashed sets come from `im`; the
//! types that have no ready-made counterpart live here.
//!
//! # Key Types
//!
//! - [`Tag`] / [`TagId`] -- Identity-keyed handle naming a service slot
//! - [`Context`] -- Persistent, insertion-ordered map from tags to services
//! - [`Service`] -- Type-erased shared service value stored in a [`Context`]
//! - [`Either`] -- Two-branch sum type

pub mod context;
pub mod either;
pub mod error;
pub mod tag;

pub use context::{same_service, Context, Service};
pub use either::Either;
pub use error::ContextError;
pub use tag::{Tag, TagId};

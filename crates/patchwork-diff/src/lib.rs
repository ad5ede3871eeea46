//! Diff/patch algebra for patchwork.
//!
//! A [`Differ`] bundles four pure operations over a value type: `empty`,
//! `diff(old, new)`, `combine(first, second)` and `patch(patch, old)`.
//! Producers diff their private changes against a shared snapshot, any
//! number of resulting patches are folded together with `combine` (O(1),
//! no coordination), and a single consumer replays the combined patch once
//! against the canonical base.
//!
//! # Key Types
//!
//! - [`Differ`] / [`DifferExt`] -- The contract and its combinators
//! - [`UpdateDiffer`] / [`UpdateWithDiffer`] / [`UpdatePatch`] -- Opaque scalar values
//! - [`ChunkDiffer`] / [`ChunkPatch`] -- Ordered sequences (`im::Vector`)
//! - [`VecDiffer`] / [`VecPatch`] -- Ordered sequences (`Vec`)
//! - [`ContextDiffer`] / [`ContextPatch`] -- Tag-keyed service contexts
//! - [`HashMapDiffer`] / [`HashMapPatch`] -- Keyed maps with a value differ
//! - [`HashSetDiffer`] / [`HashSetPatch`] -- Membership-only sets
//! - [`OrDiffer`] / [`OrPatch`] -- Two-branch sums
//! - [`ZipDiffer`] / [`TransformDiffer`] / [`FnDiffer`] -- Products, isomorphisms, custom differs
//! - [`PatchConfig`] -- Apply-time policy for instructions with absent targets
//!
//! # Design Rules
//!
//! 1. `diff`, `combine` and `patch` never mutate their inputs.
//! 2. `combine(a, b)` runs `a` before `b`; it is associative, not commutative.
//! 3. Applying and dropping patches is stack-safe for any combine depth.
//! 4. An instruction whose target is gone is skipped unless the
//!    configuration asks for it to be rejected.

pub mod chunk;
pub mod config;
pub mod context;
pub mod custom;
pub mod differ;
pub mod error;
pub mod hash_map;
pub mod hash_set;
pub mod or;
pub mod transform;
pub mod update;
pub mod vec;
pub mod zip;

mod tree;

pub use chunk::{chunk, ChunkDiffer, ChunkPatch};
pub use config::{MissingTarget, PatchConfig};
pub use context::{environment, ContextDiffer, ContextPatch, UpdateFn};
pub use custom::{make, FnDiffer};
pub use differ::{combine, combine_all, diff, empty, patch, Differ, DifferExt};
pub use error::{DiffError, DiffResult};
pub use hash_map::{hash_map, HashMapDiffer, HashMapPatch};
pub use hash_set::{hash_set, HashSetDiffer, HashSetPatch};
pub use or::{or_else_either, or_else_result, OrDiffer, OrPatch, OrPatchOf};
pub use transform::{transform, TransformDiffer};
pub use update::{update, update_with, UpdateDiffer, UpdatePatch, UpdateWithDiffer};
pub use vec::{vec, VecDiffer, VecPatch};
pub use zip::{zip, ZipDiffer};

pub use patchwork_types::{Context, Either, Service, Tag, TagId};

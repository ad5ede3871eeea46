//! Ordered sequence differ over [`im::Vector`].
//!
//! Diffing walks the shared prefix of the two sequences, emitting an
//! `Update` for every index whose element changed, then either drops the
//! surplus tail of the old sequence with a `Slice` or appends the surplus
//! tail of the new one.
//!
//! # Invariants
//!
//! - Instructions run strictly in combine order. An `Update` addresses the
//!   index as it stands after every earlier instruction has run.
//! - Application works on a clone of the old vector; the caller's value is
//!   never touched.

use std::fmt;
use std::sync::Arc;

use im::Vector;
use tracing::debug;

use crate::config::PatchConfig;
use crate::differ::Differ;
use crate::error::DiffResult;
use crate::tree::{dismantle, tree_eq, tree_fmt, walk, PatchTree};

const CONTAINER: &str = "chunk";

/// A change to an [`im::Vector`] whose elements are patched with `P`.
pub enum ChunkPatch<A, P> {
    Empty,
    AndThen(Arc<ChunkPatch<A, P>>, Arc<ChunkPatch<A, P>>),
    /// Concatenate these values onto the end.
    Append(Vector<A>),
    /// Keep only the half-open index range `from..until`.
    Slice { from: usize, until: usize },
    /// Patch the element at `index`.
    Update { index: usize, patch: P },
}

impl<A, P> ChunkPatch<A, P> {
    pub fn is_empty(&self) -> bool {
        matches!(self, ChunkPatch::Empty)
    }

    /// Sequence `self` before `that`.
    pub fn and_then(self, that: Self) -> Self {
        if self.is_empty() {
            return that;
        }
        if that.is_empty() {
            return self;
        }
        ChunkPatch::AndThen(Arc::new(self), Arc::new(that))
    }
}

impl<A, P> PatchTree for ChunkPatch<A, P> {
    fn vacant() -> Self {
        ChunkPatch::Empty
    }

    fn children(&self) -> Option<(&Self, &Self)> {
        match self {
            ChunkPatch::AndThen(first, second) => Some((&**first, &**second)),
            _ => None,
        }
    }

    fn children_mut(&mut self) -> Option<(&mut Arc<Self>, &mut Arc<Self>)> {
        match self {
            ChunkPatch::AndThen(first, second) => Some((first, second)),
            _ => None,
        }
    }
}

impl<A, P> Drop for ChunkPatch<A, P> {
    fn drop(&mut self) {
        dismantle(self);
    }
}

impl<A: Clone, P: Clone> Clone for ChunkPatch<A, P> {
    fn clone(&self) -> Self {
        match self {
            ChunkPatch::Empty => ChunkPatch::Empty,
            ChunkPatch::AndThen(first, second) => {
                ChunkPatch::AndThen(Arc::clone(first), Arc::clone(second))
            }
            ChunkPatch::Append(values) => ChunkPatch::Append(values.clone()),
            ChunkPatch::Slice { from, until } => ChunkPatch::Slice {
                from: *from,
                until: *until,
            },
            ChunkPatch::Update { index, patch } => ChunkPatch::Update {
                index: *index,
                patch: patch.clone(),
            },
        }
    }
}

impl<A: Clone + PartialEq, P: PartialEq> PartialEq for ChunkPatch<A, P> {
    fn eq(&self, other: &Self) -> bool {
        tree_eq(self, other, |left, right| match (left, right) {
            (ChunkPatch::Empty, ChunkPatch::Empty) => true,
            (ChunkPatch::Append(x), ChunkPatch::Append(y)) => x == y,
            (
                ChunkPatch::Slice { from, until },
                ChunkPatch::Slice {
                    from: other_from,
                    until: other_until,
                },
            ) => from == other_from && until == other_until,
            (
                ChunkPatch::Update { index, patch },
                ChunkPatch::Update {
                    index: other_index,
                    patch: other_patch,
                },
            ) => index == other_index && patch == other_patch,
            _ => false,
        })
    }
}

impl<A: Clone + fmt::Debug, P: fmt::Debug> fmt::Debug for ChunkPatch<A, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        tree_fmt(self, f, |leaf, f| match leaf {
            ChunkPatch::Empty | ChunkPatch::AndThen(..) => f.write_str("Empty"),
            ChunkPatch::Append(values) => f.debug_tuple("Append").field(values).finish(),
            ChunkPatch::Slice { from, until } => f
                .debug_struct("Slice")
                .field("from", from)
                .field("until", until)
                .finish(),
            ChunkPatch::Update { index, patch } => f
                .debug_struct("Update")
                .field("index", index)
                .field("patch", patch)
                .finish(),
        })
    }
}

/// Differ for [`im::Vector`] built on an element differ.
#[derive(Clone, Debug, Default)]
pub struct ChunkDiffer<D> {
    element: D,
}

/// A sequence differ that patches elements with `element`.
pub fn chunk<D: Differ>(element: D) -> ChunkDiffer<D> {
    ChunkDiffer { element }
}

impl<D: Differ> Differ for ChunkDiffer<D> {
    type Value = Vector<D::Value>;
    type Patch = ChunkPatch<D::Value, D::Patch>;

    fn empty(&self) -> Self::Patch {
        ChunkPatch::Empty
    }

    fn is_empty(&self, patch: &Self::Patch) -> bool {
        patch.is_empty()
    }

    fn diff(&self, old: &Self::Value, new: &Self::Value) -> Self::Patch {
        let mut patch = ChunkPatch::Empty;

        for (index, (before, after)) in old.iter().zip(new.iter()).enumerate() {
            let inner = self.element.diff(before, after);
            if !self.element.is_empty(&inner) {
                patch = patch.and_then(ChunkPatch::Update {
                    index,
                    patch: inner,
                });
            }
        }

        let shared = old.len().min(new.len());
        if old.len() > shared {
            patch = patch.and_then(ChunkPatch::Slice {
                from: 0,
                until: shared,
            });
        } else if new.len() > shared {
            patch = patch.and_then(ChunkPatch::Append(new.clone().slice(shared..)));
        }

        patch
    }

    fn combine(&self, first: &Self::Patch, second: &Self::Patch) -> Self::Patch {
        first.clone().and_then(second.clone())
    }

    fn apply(
        &self,
        patch: &Self::Patch,
        old: &Self::Value,
        config: &PatchConfig,
    ) -> DiffResult<Self::Value> {
        let mut chunk = old.clone();

        let instructions = walk(patch, config.worklist_capacity, |node| {
            match node {
                ChunkPatch::Empty | ChunkPatch::AndThen(..) => {}
                ChunkPatch::Append(values) => chunk.append(values.clone()),
                ChunkPatch::Slice { from, until } => {
                    let len = chunk.len();
                    if from > until || *until > len {
                        config.resolve_missing(CONTAINER, "Slice")?;
                    }
                    let until = (*until).min(len);
                    let from = (*from).min(until);
                    chunk = chunk.slice(from..until);
                }
                ChunkPatch::Update { index, patch } => match chunk.get(*index) {
                    Some(current) => {
                        let next = self.element.apply(patch, current, config)?;
                        chunk.set(*index, next);
                    }
                    None => config.resolve_missing(CONTAINER, "Update")?,
                },
            }
            Ok(())
        })?;

        debug!(container = CONTAINER, instructions, len = chunk.len(), "applied patch");
        Ok(chunk)
    }
}

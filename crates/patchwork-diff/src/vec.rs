//! Ordered sequence differ over plain [`Vec`].
//!
//! Same instruction set and diff strategy as [`chunk`](crate::chunk), for
//! callers that hold ordinary vectors instead of persistent ones. Applying
//! a patch copies the old vector once.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::PatchConfig;
use crate::differ::Differ;
use crate::error::DiffResult;
use crate::tree::{dismantle, tree_eq, tree_fmt, walk, PatchTree};

const CONTAINER: &str = "vec";

/// A change to a [`Vec`] whose elements are patched with `P`.
#[derive(Clone)]
pub enum VecPatch<A, P> {
    Empty,
    AndThen(Arc<VecPatch<A, P>>, Arc<VecPatch<A, P>>),
    Append(Vec<A>),
    Slice { from: usize, until: usize },
    Update { index: usize, patch: P },
}

impl<A, P> VecPatch<A, P> {
    pub fn is_empty(&self) -> bool {
        matches!(self, VecPatch::Empty)
    }

    pub fn and_then(self, that: Self) -> Self {
        if self.is_empty() {
            return that;
        }
        if that.is_empty() {
            return self;
        }
        VecPatch::AndThen(Arc::new(self), Arc::new(that))
    }
}

impl<A, P> PatchTree for VecPatch<A, P> {
    fn vacant() -> Self {
        VecPatch::Empty
    }

    fn children(&self) -> Option<(&Self, &Self)> {
        match self {
            VecPatch::AndThen(first, second) => Some((&**first, &**second)),
            _ => None,
        }
    }

    fn children_mut(&mut self) -> Option<(&mut Arc<Self>, &mut Arc<Self>)> {
        match self {
            VecPatch::AndThen(first, second) => Some((first, second)),
            _ => None,
        }
    }
}

impl<A, P> Drop for VecPatch<A, P> {
    fn drop(&mut self) {
        dismantle(self);
    }
}

impl<A: PartialEq, P: PartialEq> PartialEq for VecPatch<A, P> {
    fn eq(&self, other: &Self) -> bool {
        tree_eq(self, other, |left, right| match (left, right) {
            (VecPatch::Empty, VecPatch::Empty) => true,
            (VecPatch::Append(x), VecPatch::Append(y)) => x == y,
            (
                VecPatch::Slice { from, until },
                VecPatch::Slice {
                    from: other_from,
                    until: other_until,
                },
            ) => from == other_from && until == other_until,
            (
                VecPatch::Update { index, patch },
                VecPatch::Update {
                    index: other_index,
                    patch: other_patch,
                },
            ) => index == other_index && patch == other_patch,
            _ => false,
        })
    }
}

impl<A: fmt::Debug, P: fmt::Debug> fmt::Debug for VecPatch<A, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        tree_fmt(self, f, |leaf, f| match leaf {
            VecPatch::Empty | VecPatch::AndThen(..) => f.write_str("Empty"),
            VecPatch::Append(values) => f.debug_tuple("Append").field(values).finish(),
            VecPatch::Slice { from, until } => f
                .debug_struct("Slice")
                .field("from", from)
                .field("until", until)
                .finish(),
            VecPatch::Update { index, patch } => f
                .debug_struct("Update")
                .field("index", index)
                .field("patch", patch)
                .finish(),
        })
    }
}

/// Differ for [`Vec`] built on an element differ.
#[derive(Clone, Debug, Default)]
pub struct VecDiffer<D> {
    element: D,
}

/// A vector differ that patches elements with `element`.
pub fn vec<D: Differ>(element: D) -> VecDiffer<D> {
    VecDiffer { element }
}

impl<D: Differ> Differ for VecDiffer<D> {
    type Value = Vec<D::Value>;
    type Patch = VecPatch<D::Value, D::Patch>;

    fn empty(&self) -> Self::Patch {
        VecPatch::Empty
    }

    fn is_empty(&self, patch: &Self::Patch) -> bool {
        patch.is_empty()
    }

    fn diff(&self, old: &Self::Value, new: &Self::Value) -> Self::Patch {
        let mut patch = VecPatch::Empty;

        for (index, (before, after)) in old.iter().zip(new).enumerate() {
            let inner = self.element.diff(before, after);
            if !self.element.is_empty(&inner) {
                patch = patch.and_then(VecPatch::Update {
                    index,
                    patch: inner,
                });
            }
        }

        let shared = old.len().min(new.len());
        if old.len() > shared {
            patch = patch.and_then(VecPatch::Slice {
                from: 0,
                until: shared,
            });
        } else if new.len() > shared {
            patch = patch.and_then(VecPatch::Append(new[shared..].to_vec()));
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
        let mut values = old.clone();

        let instructions = walk(patch, config.worklist_capacity, |node| {
            match node {
                VecPatch::Empty | VecPatch::AndThen(..) => {}
                VecPatch::Append(tail) => values.extend_from_slice(tail),
                VecPatch::Slice { from, until } => {
                    let len = values.len();
                    if from > until || *until > len {
                        config.resolve_missing(CONTAINER, "Slice")?;
                    }
                    let until = (*until).min(len);
                    let from = (*from).min(until);
                    values.truncate(until);
                    values.drain(..from);
                }
                VecPatch::Update { index, patch } => match values.get(*index) {
                    Some(current) => {
                        let next = self.element.apply(patch, current, config)?;
                        values[*index] = next;
                    }
                    None => config.resolve_missing(CONTAINER, "Update")?,
                },
            }
            Ok(())
        })?;

        debug!(container = CONTAINER, instructions, len = values.len(), "applied patch");
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::update::{update, UpdatePatch};

    #[test]
    fn shrink_then_grow() {
        let d = vec(update::<char>());
        let a = vec!['a', 'b', 'c', 'd'];
        let b = vec!['a', 'x'];
        let c = vec!['a', 'x', 'y', 'z'];

        let shrink = d.diff(&a, &b);
        assert_eq!(
            shrink,
            VecPatch::Update {
                index: 1,
                patch: UpdatePatch::Set('x'),
            }
            .and_then(VecPatch::Slice { from: 0, until: 2 })
        );

        let both = d.combine(&shrink, &d.diff(&b, &c));
        assert_eq!(d.patch(&both, &a), c);
    }

    #[test]
    fn slice_from_middle() {
        let d = vec(update::<u8>());
        let p = VecPatch::Slice { from: 1, until: 3 };
        assert_eq!(d.patch(&p, &vec![0, 1, 2, 3, 4]), vec![1, 2]);
    }

    #[test]
    fn identical_vectors_diff_to_empty() {
        let d = vec(update::<u8>());
        assert!(d.diff(&vec![1, 2], &vec![1, 2]).is_empty());
        assert!(d.diff(&Vec::new(), &Vec::new()).is_empty());
    }
}

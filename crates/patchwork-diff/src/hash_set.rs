//! Membership differ over [`im::HashSet`].
//!
//! Elements carry no inner differ: a value is either present or it is not.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::mem;
use std::sync::Arc;

use im::HashSet;
use tracing::debug;

use crate::config::PatchConfig;
use crate::differ::Differ;
use crate::error::DiffResult;
use crate::tree::{dismantle, tree_eq, tree_fmt, tree_hash, walk, PatchTree};

/// A change to an [`im::HashSet`].
///
/// Leaves compare and hash by variant and payload, so patches can be
/// deduplicated or used as keys.
#[derive(Clone)]
pub enum HashSetPatch<A> {
    Empty,
    AndThen(Arc<HashSetPatch<A>>, Arc<HashSetPatch<A>>),
    Add(A),
    Remove(A),
}

impl<A> HashSetPatch<A> {
    pub fn is_empty(&self) -> bool {
        matches!(self, HashSetPatch::Empty)
    }

    pub fn and_then(self, that: Self) -> Self {
        if self.is_empty() {
            return that;
        }
        if that.is_empty() {
            return self;
        }
        HashSetPatch::AndThen(Arc::new(self), Arc::new(that))
    }
}

impl<A> PatchTree for HashSetPatch<A> {
    fn vacant() -> Self {
        HashSetPatch::Empty
    }

    fn children(&self) -> Option<(&Self, &Self)> {
        match self {
            HashSetPatch::AndThen(first, second) => Some((&**first, &**second)),
            _ => None,
        }
    }

    fn children_mut(&mut self) -> Option<(&mut Arc<Self>, &mut Arc<Self>)> {
        match self {
            HashSetPatch::AndThen(first, second) => Some((first, second)),
            _ => None,
        }
    }
}

impl<A> Drop for HashSetPatch<A> {
    fn drop(&mut self) {
        dismantle(self);
    }
}

impl<A: PartialEq> PartialEq for HashSetPatch<A> {
    fn eq(&self, other: &Self) -> bool {
        tree_eq(self, other, |left, right| match (left, right) {
            (HashSetPatch::Empty, HashSetPatch::Empty) => true,
            (HashSetPatch::Add(x), HashSetPatch::Add(y))
            | (HashSetPatch::Remove(x), HashSetPatch::Remove(y)) => x == y,
            _ => false,
        })
    }
}

impl<A: Eq> Eq for HashSetPatch<A> {}

impl<A: Hash> Hash for HashSetPatch<A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        tree_hash(self, state, |leaf, state| {
            mem::discriminant(leaf).hash(state);
            if let HashSetPatch::Add(value) | HashSetPatch::Remove(value) = leaf {
                value.hash(state);
            }
        })
    }
}

impl<A: fmt::Debug> fmt::Debug for HashSetPatch<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        tree_fmt(self, f, |leaf, f| match leaf {
            HashSetPatch::Empty | HashSetPatch::AndThen(..) => f.write_str("Empty"),
            HashSetPatch::Add(value) => f.debug_tuple("Add").field(value).finish(),
            HashSetPatch::Remove(value) => f.debug_tuple("Remove").field(value).finish(),
        })
    }
}

/// Differ for [`im::HashSet`].
pub struct HashSetDiffer<A> {
    _value: PhantomData<fn() -> A>,
}

/// A set differ tracking membership only.
pub fn hash_set<A: Hash + Eq + Clone>() -> HashSetDiffer<A> {
    HashSetDiffer {
        _value: PhantomData,
    }
}

impl<A> Clone for HashSetDiffer<A> {
    fn clone(&self) -> Self {
        Self {
            _value: PhantomData,
        }
    }
}

impl<A> fmt::Debug for HashSetDiffer<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashSetDiffer")
    }
}

impl<A: Hash + Eq + Clone> Differ for HashSetDiffer<A> {
    type Value = HashSet<A>;
    type Patch = HashSetPatch<A>;

    fn empty(&self) -> Self::Patch {
        HashSetPatch::Empty
    }

    fn is_empty(&self, patch: &Self::Patch) -> bool {
        patch.is_empty()
    }

    fn diff(&self, old: &Self::Value, new: &Self::Value) -> Self::Patch {
        let mut removed = old.clone();
        let mut patch = HashSetPatch::Empty;

        for value in new.iter() {
            if removed.remove(value).is_none() {
                patch = patch.and_then(HashSetPatch::Add(value.clone()));
            }
        }
        for value in removed.iter() {
            patch = patch.and_then(HashSetPatch::Remove(value.clone()));
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
        let mut set = old.clone();

        let instructions = walk(patch, config.worklist_capacity, |node| {
            match node {
                HashSetPatch::Empty | HashSetPatch::AndThen(..) => {}
                HashSetPatch::Add(value) => {
                    set.insert(value.clone());
                }
                HashSetPatch::Remove(value) => {
                    set.remove(value);
                }
            }
            Ok(())
        })?;

        debug!(container = "hash_set", instructions, len = set.len(), "applied patch");
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use im::hashset;

    #[test]
    fn swap_one_member() {
        let d = hash_set::<u32>();
        let old = hashset! {1, 2, 3};
        let new = hashset! {2, 3, 4};
        let p = d.diff(&old, &new);
        assert_eq!(
            p,
            HashSetPatch::Add(4).and_then(HashSetPatch::Remove(1))
        );
        assert_eq!(d.patch(&p, &old), new);
    }

    #[test]
    fn identical_sets_diff_to_empty() {
        let d = hash_set::<&str>();
        let s = hashset! {"a", "b"};
        assert_eq!(d.diff(&s, &s), HashSetPatch::Empty);
    }

    #[test]
    fn remove_then_add_restores_member() {
        let d = hash_set::<u8>();
        let p = HashSetPatch::Remove(1).and_then(HashSetPatch::Add(1));
        assert_eq!(d.patch(&p, &hashset! {1}), hashset! {1});
        let q = HashSetPatch::Add(1).and_then(HashSetPatch::Remove(1));
        assert_eq!(d.patch(&q, &hashset! {1}), HashSet::new());
    }

    #[test]
    fn leaves_deduplicate_by_payload() {
        let mut seen = std::collections::HashSet::new();
        assert!(seen.insert(HashSetPatch::Add(7)));
        assert!(!seen.insert(HashSetPatch::Add(7)));
        assert!(seen.insert(HashSetPatch::Remove(7)));
    }

    #[test]
    fn removing_absent_member_is_harmless() {
        let d = hash_set::<u8>();
        let p = HashSetPatch::Remove(9);
        assert_eq!(
            d.apply(&p, &hashset! {1}, &PatchConfig::strict()).unwrap(),
            hashset! {1}
        );
    }
}

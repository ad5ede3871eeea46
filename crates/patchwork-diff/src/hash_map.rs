//! Keyed map differ over [`im::HashMap`], generic over a value differ.

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

use im::HashMap;
use tracing::debug;

use crate::config::PatchConfig;
use crate::differ::Differ;
use crate::error::DiffResult;
use crate::tree::{dismantle, tree_eq, tree_fmt, walk, PatchTree};

const CONTAINER: &str = "hash_map";

/// A change to an [`im::HashMap`] whose values are patched with `P`.
#[derive(Clone)]
pub enum HashMapPatch<K, V, P> {
    Empty,
    AndThen(Arc<HashMapPatch<K, V, P>>, Arc<HashMapPatch<K, V, P>>),
    /// Bind `key` to `value`, replacing any existing binding.
    Add { key: K, value: V },
    Remove { key: K },
    /// Patch the value bound to `key`.
    Update { key: K, patch: P },
}

impl<K, V, P> HashMapPatch<K, V, P> {
    pub fn is_empty(&self) -> bool {
        matches!(self, HashMapPatch::Empty)
    }

    pub fn and_then(self, that: Self) -> Self {
        if self.is_empty() {
            return that;
        }
        if that.is_empty() {
            return self;
        }
        HashMapPatch::AndThen(Arc::new(self), Arc::new(that))
    }
}

impl<K, V, P> PatchTree for HashMapPatch<K, V, P> {
    fn vacant() -> Self {
        HashMapPatch::Empty
    }

    fn children(&self) -> Option<(&Self, &Self)> {
        match self {
            HashMapPatch::AndThen(first, second) => Some((&**first, &**second)),
            _ => None,
        }
    }

    fn children_mut(&mut self) -> Option<(&mut Arc<Self>, &mut Arc<Self>)> {
        match self {
            HashMapPatch::AndThen(first, second) => Some((first, second)),
            _ => None,
        }
    }
}

impl<K, V, P> Drop for HashMapPatch<K, V, P> {
    fn drop(&mut self) {
        dismantle(self);
    }
}

impl<K: PartialEq, V: PartialEq, P: PartialEq> PartialEq for HashMapPatch<K, V, P> {
    fn eq(&self, other: &Self) -> bool {
        tree_eq(self, other, |left, right| match (left, right) {
            (HashMapPatch::Empty, HashMapPatch::Empty) => true,
            (
                HashMapPatch::Add { key, value },
                HashMapPatch::Add {
                    key: other_key,
                    value: other_value,
                },
            ) => key == other_key && value == other_value,
            (HashMapPatch::Remove { key }, HashMapPatch::Remove { key: other_key }) => {
                key == other_key
            }
            (
                HashMapPatch::Update { key, patch },
                HashMapPatch::Update {
                    key: other_key,
                    patch: other_patch,
                },
            ) => key == other_key && patch == other_patch,
            _ => false,
        })
    }
}

impl<K: fmt::Debug, V: fmt::Debug, P: fmt::Debug> fmt::Debug for HashMapPatch<K, V, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        tree_fmt(self, f, |leaf, f| match leaf {
            HashMapPatch::Empty | HashMapPatch::AndThen(..) => f.write_str("Empty"),
            HashMapPatch::Add { key, value } => f
                .debug_struct("Add")
                .field("key", key)
                .field("value", value)
                .finish(),
            HashMapPatch::Remove { key } => f.debug_struct("Remove").field("key", key).finish(),
            HashMapPatch::Update { key, patch } => f
                .debug_struct("Update")
                .field("key", key)
                .field("patch", patch)
                .finish(),
        })
    }
}

/// Differ for [`im::HashMap`] with values diffed by `D`.
pub struct HashMapDiffer<K, D> {
    value: D,
    _key: PhantomData<fn() -> K>,
}

/// A map differ that patches values with `value`.
pub fn hash_map<K, D>(value: D) -> HashMapDiffer<K, D>
where
    K: Hash + Eq + Clone,
    D: Differ,
{
    HashMapDiffer {
        value,
        _key: PhantomData,
    }
}

impl<K, D: Clone> Clone for HashMapDiffer<K, D> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            _key: PhantomData,
        }
    }
}

impl<K, D: std::fmt::Debug> std::fmt::Debug for HashMapDiffer<K, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashMapDiffer")
            .field("value", &self.value)
            .finish()
    }
}

impl<K, D> Differ for HashMapDiffer<K, D>
where
    K: Hash + Eq + Clone,
    D: Differ,
{
    type Value = HashMap<K, D::Value>;
    type Patch = HashMapPatch<K, D::Value, D::Patch>;

    fn empty(&self) -> Self::Patch {
        HashMapPatch::Empty
    }

    fn is_empty(&self, patch: &Self::Patch) -> bool {
        patch.is_empty()
    }

    fn diff(&self, old: &Self::Value, new: &Self::Value) -> Self::Patch {
        let mut removed = old.clone();
        let mut patch = HashMapPatch::Empty;

        for (key, new_value) in new.iter() {
            match removed.remove(key) {
                Some(old_value) => {
                    let inner = self.value.diff(&old_value, new_value);
                    if !self.value.is_empty(&inner) {
                        patch = patch.and_then(HashMapPatch::Update {
                            key: key.clone(),
                            patch: inner,
                        });
                    }
                }
                None => {
                    patch = patch.and_then(HashMapPatch::Add {
                        key: key.clone(),
                        value: new_value.clone(),
                    });
                }
            }
        }

        for (key, _) in removed.iter() {
            patch = patch.and_then(HashMapPatch::Remove { key: key.clone() });
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
        let mut map = old.clone();

        let instructions = walk(patch, config.worklist_capacity, |node| {
            match node {
                HashMapPatch::Empty | HashMapPatch::AndThen(..) => {}
                HashMapPatch::Add { key, value } => {
                    map.insert(key.clone(), value.clone());
                }
                HashMapPatch::Remove { key } => {
                    map.remove(key);
                }
                HashMapPatch::Update { key, patch } => match map.get(key) {
                    Some(current) => {
                        let next = self.value.apply(patch, current, config)?;
                        map.insert(key.clone(), next);
                    }
                    None => config.resolve_missing(CONTAINER, "Update")?,
                },
            }
            Ok(())
        })?;

        debug!(container = CONTAINER, instructions, len = map.len(), "applied patch");
        Ok(map)
    }
}

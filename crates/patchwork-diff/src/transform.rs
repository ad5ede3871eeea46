//! Adapting a differ across an isomorphism.

use std::fmt;
use std::marker::PhantomData;

use crate::config::PatchConfig;
use crate::differ::Differ;
use crate::error::DiffResult;

/// Differ for `V` that delegates to a differ for an isomorphic type.
///
/// `to_inner` and `from_inner` must be mutually inverse; patches are the
/// inner differ's patches unchanged.
pub struct TransformDiffer<D, V, F, G> {
    inner: D,
    to_inner: F,
    from_inner: G,
    _value: PhantomData<fn() -> V>,
}

impl<D, V, F, G> TransformDiffer<D, V, F, G> {
    pub fn new(inner: D, to_inner: F, from_inner: G) -> Self {
        Self {
            inner,
            to_inner,
            from_inner,
            _value: PhantomData,
        }
    }
}

/// Reuse `inner` for values of type `V`.
pub fn transform<D, V, F, G>(inner: D, to_inner: F, from_inner: G) -> TransformDiffer<D, V, F, G>
where
    D: Differ,
    V: Clone,
    F: Fn(&V) -> D::Value,
    G: Fn(D::Value) -> V,
{
    TransformDiffer::new(inner, to_inner, from_inner)
}

impl<D: Clone, V, F: Clone, G: Clone> Clone for TransformDiffer<D, V, F, G> {
    fn clone(&self) -> Self {
        Self::new(
            self.inner.clone(),
            self.to_inner.clone(),
            self.from_inner.clone(),
        )
    }
}

impl<D: fmt::Debug, V, F, G> fmt::Debug for TransformDiffer<D, V, F, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformDiffer")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<D, V, F, G> Differ for TransformDiffer<D, V, F, G>
where
    D: Differ,
    V: Clone,
    F: Fn(&V) -> D::Value,
    G: Fn(D::Value) -> V,
{
    type Value = V;
    type Patch = D::Patch;

    fn empty(&self) -> Self::Patch {
        self.inner.empty()
    }

    fn is_empty(&self, patch: &Self::Patch) -> bool {
        self.inner.is_empty(patch)
    }

    fn diff(&self, old: &V, new: &V) -> Self::Patch {
        self.inner
            .diff(&(self.to_inner)(old), &(self.to_inner)(new))
    }

    fn combine(&self, first: &Self::Patch, second: &Self::Patch) -> Self::Patch {
        self.inner.combine(first, second)
    }

    fn apply(&self, patch: &Self::Patch, old: &V, config: &PatchConfig) -> DiffResult<V> {
        let patched = self.inner.apply(patch, &(self.to_inner)(old), config)?;
        Ok((self.from_inner)(patched))
    }
}

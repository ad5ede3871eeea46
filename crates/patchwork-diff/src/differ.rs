//! The [`Differ`] contract and the free functions that delegate to it.

use std::sync::Arc;

use tracing::debug;

use crate::config::PatchConfig;
use crate::error::DiffResult;
use crate::or::OrDiffer;
use crate::transform::TransformDiffer;
use crate::zip::ZipDiffer;

/// Computes, combines and replays structural changes to values of one type.
///
/// # Laws
///
/// For every `old`, `new` and patches `a`, `b`, `c`:
///
/// - `patch(empty, v) == v`
/// - `combine(x, empty) == combine(empty, x) == x`
/// - `diff(v, v) == empty`
/// - `patch(diff(old, new), old) == new`
/// - `combine` is associative; it is not commutative in general.
///
/// `combine(a, b)` means "the effects of `a` happen before the effects of
/// `b`". It only allocates a wrapper node, so it is O(1) regardless of how
/// large either side is.
pub trait Differ {
    /// The value being changed.
    type Value: Clone;
    /// A description of a change to a [`Value`](Differ::Value).
    type Patch: Clone;

    /// The patch that changes nothing.
    fn empty(&self) -> Self::Patch;

    /// Returns `true` if `patch` is the empty patch.
    ///
    /// This is a tag check, not a deep comparison.
    fn is_empty(&self, patch: &Self::Patch) -> bool;

    /// A patch that turns `old` into `new`.
    fn diff(&self, old: &Self::Value, new: &Self::Value) -> Self::Patch;

    /// A patch that applies `first` and then `second`.
    fn combine(&self, first: &Self::Patch, second: &Self::Patch) -> Self::Patch;

    /// Apply `patch` to `old` under `config`.
    ///
    /// `old` is never modified. With the default configuration this never
    /// fails.
    fn apply(
        &self,
        patch: &Self::Patch,
        old: &Self::Value,
        config: &PatchConfig,
    ) -> DiffResult<Self::Value>;

    /// Apply `patch` to `old`, skipping instructions whose target is absent.
    ///
    /// Implementations of [`apply`](Differ::apply) must not fail under the
    /// default configuration. If one does anyway, the error is logged and
    /// `old` is returned unchanged.
    fn patch(&self, patch: &Self::Patch, old: &Self::Value) -> Self::Value {
        self.apply(patch, old, &PatchConfig::default())
            .unwrap_or_else(|err| {
                debug!(error = %err, "lenient apply failed, keeping old value");
                old.clone()
            })
    }
}

impl<D: Differ + ?Sized> Differ for &D {
    type Value = D::Value;
    type Patch = D::Patch;

    fn empty(&self) -> Self::Patch {
        (**self).empty()
    }

    fn is_empty(&self, patch: &Self::Patch) -> bool {
        (**self).is_empty(patch)
    }

    fn diff(&self, old: &Self::Value, new: &Self::Value) -> Self::Patch {
        (**self).diff(old, new)
    }

    fn combine(&self, first: &Self::Patch, second: &Self::Patch) -> Self::Patch {
        (**self).combine(first, second)
    }

    fn apply(
        &self,
        patch: &Self::Patch,
        old: &Self::Value,
        config: &PatchConfig,
    ) -> DiffResult<Self::Value> {
        (**self).apply(patch, old, config)
    }
}

impl<D: Differ + ?Sized> Differ for Arc<D> {
    type Value = D::Value;
    type Patch = D::Patch;

    fn empty(&self) -> Self::Patch {
        (**self).empty()
    }

    fn is_empty(&self, patch: &Self::Patch) -> bool {
        (**self).is_empty(patch)
    }

    fn diff(&self, old: &Self::Value, new: &Self::Value) -> Self::Patch {
        (**self).diff(old, new)
    }

    fn combine(&self, first: &Self::Patch, second: &Self::Patch) -> Self::Patch {
        (**self).combine(first, second)
    }

    fn apply(
        &self,
        patch: &Self::Patch,
        old: &Self::Value,
        config: &PatchConfig,
    ) -> DiffResult<Self::Value> {
        (**self).apply(patch, old, config)
    }
}

/// Combinators available on every [`Differ`].
pub trait DifferExt: Differ + Sized {
    /// Pair this differ with `that`, diffing tuples component-wise.
    fn zip<B: Differ>(self, that: B) -> ZipDiffer<Self, B> {
        ZipDiffer::new(self, that)
    }

    /// Diff `Either<Self::Value, B::Value>` with `self` on the left branch
    /// and `that` on the right.
    fn or_else_either<B: Differ>(self, that: B) -> OrDiffer<Self, B> {
        OrDiffer::new(self, that)
    }

    /// Reuse this differ for a type `V` isomorphic to `Self::Value`.
    fn transform<V, F, G>(self, to_inner: F, from_inner: G) -> TransformDiffer<Self, V, F, G>
    where
        V: Clone,
        F: Fn(&V) -> Self::Value,
        G: Fn(Self::Value) -> V,
    {
        TransformDiffer::new(self, to_inner, from_inner)
    }
}

impl<D: Differ> DifferExt for D {}

/// The empty patch of `differ`.
pub fn empty<D: Differ>(differ: &D) -> D::Patch {
    differ.empty()
}

/// A patch that turns `old` into `new`.
pub fn diff<D: Differ>(differ: &D, old: &D::Value, new: &D::Value) -> D::Patch {
    differ.diff(old, new)
}

/// A patch that applies `first` and then `second`.
pub fn combine<D: Differ>(differ: &D, first: &D::Patch, second: &D::Patch) -> D::Patch {
    differ.combine(first, second)
}

/// Apply `patch` to `old`.
pub fn patch<D: Differ>(differ: &D, patch: &D::Patch, old: &D::Value) -> D::Value {
    differ.patch(patch, old)
}

/// Fold `patches` left to right into one patch.
///
/// Iteration order is the happens-before order at apply time. Callers
/// folding patches produced concurrently should sort them into a
/// deterministic order (arrival order, producer id, ...) first.
pub fn combine_all<D, I>(differ: &D, patches: I) -> D::Patch
where
    D: Differ,
    I: IntoIterator<Item = D::Patch>,
{
    patches
        .into_iter()
        .fold(differ.empty(), |acc, next| differ.combine(&acc, &next))
}

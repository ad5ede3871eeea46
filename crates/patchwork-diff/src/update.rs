//! Scalar differs for opaque values.
//!
//! [`update`] replaces the old value wholesale; [`update_with`] hands the old
//! and the patched value to a merge function instead, so repeated patches
//! can accumulate rather than overwrite.

use std::fmt;
use std::marker::PhantomData;

use crate::config::PatchConfig;
use crate::differ::Differ;
use crate::error::DiffResult;

/// A change to an opaque value.
///
/// `Keep` is the identity function and `Set(a)` the function that always
/// returns `a`. Composing with a constant function yields that constant,
/// which is what [`Differ::combine`] relies on.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum UpdatePatch<A> {
    Keep,
    Set(A),
}

impl<A> UpdatePatch<A> {
    pub fn is_empty(&self) -> bool {
        matches!(self, UpdatePatch::Keep)
    }
}

fn diff_scalar<A: Clone + PartialEq>(old: &A, new: &A) -> UpdatePatch<A> {
    if old == new {
        UpdatePatch::Keep
    } else {
        UpdatePatch::Set(new.clone())
    }
}

fn combine_scalar<A: Clone>(first: &UpdatePatch<A>, second: &UpdatePatch<A>) -> UpdatePatch<A> {
    match second {
        UpdatePatch::Keep => first.clone(),
        UpdatePatch::Set(_) => second.clone(),
    }
}

/// Last-write-wins differ.
pub struct UpdateDiffer<A> {
    _value: PhantomData<fn() -> A>,
}

/// A differ that overwrites the old value with the new one.
pub fn update<A: Clone + PartialEq>() -> UpdateDiffer<A> {
    UpdateDiffer {
        _value: PhantomData,
    }
}

impl<A> Clone for UpdateDiffer<A> {
    fn clone(&self) -> Self {
        Self {
            _value: PhantomData,
        }
    }
}

impl<A> fmt::Debug for UpdateDiffer<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UpdateDiffer")
    }
}

impl<A: Clone + PartialEq> Differ for UpdateDiffer<A> {
    type Value = A;
    type Patch = UpdatePatch<A>;

    fn empty(&self) -> Self::Patch {
        UpdatePatch::Keep
    }

    fn is_empty(&self, patch: &Self::Patch) -> bool {
        patch.is_empty()
    }

    fn diff(&self, old: &A, new: &A) -> Self::Patch {
        diff_scalar(old, new)
    }

    fn combine(&self, first: &Self::Patch, second: &Self::Patch) -> Self::Patch {
        combine_scalar(first, second)
    }

    fn apply(&self, patch: &Self::Patch, old: &A, _config: &PatchConfig) -> DiffResult<A> {
        Ok(match patch {
            UpdatePatch::Keep => old.clone(),
            UpdatePatch::Set(value) => value.clone(),
        })
    }
}

/// Differ that merges the patched value into the old one.
#[derive(Clone)]
pub struct UpdateWithDiffer<A, F> {
    merge: F,
    _value: PhantomData<fn() -> A>,
}

/// A differ whose patches apply as `merge(old, new)`.
///
/// The empty patch leaves the value untouched without calling `merge`.
/// Round trips only hold when `merge(old, new) == new`.
pub fn update_with<A, F>(merge: F) -> UpdateWithDiffer<A, F>
where
    A: Clone + PartialEq,
    F: Fn(&A, &A) -> A,
{
    UpdateWithDiffer {
        merge,
        _value: PhantomData,
    }
}

impl<A, F> fmt::Debug for UpdateWithDiffer<A, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UpdateWithDiffer")
    }
}

impl<A, F> Differ for UpdateWithDiffer<A, F>
where
    A: Clone + PartialEq,
    F: Fn(&A, &A) -> A,
{
    type Value = A;
    type Patch = UpdatePatch<A>;

    fn empty(&self) -> Self::Patch {
        UpdatePatch::Keep
    }

    fn is_empty(&self, patch: &Self::Patch) -> bool {
        patch.is_empty()
    }

    fn diff(&self, old: &A, new: &A) -> Self::Patch {
        diff_scalar(old, new)
    }

    fn combine(&self, first: &Self::Patch, second: &Self::Patch) -> Self::Patch {
        combine_scalar(first, second)
    }

    fn apply(&self, patch: &Self::Patch, old: &A, _config: &PatchConfig) -> DiffResult<A> {
        Ok(match patch {
            UpdatePatch::Keep => old.clone(),
            UpdatePatch::Set(value) => (self.merge)(old, value),
        })
    }
}

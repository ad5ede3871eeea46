//! Two-branch sum differ over [`Either`], and its [`Result`] adaptation.
//!
//! A partial patch never crosses a branch boundary: moving from one branch
//! to the other always carries the new payload wholesale.

use std::fmt;
use std::sync::Arc;

use patchwork_types::Either;
use tracing::debug;

use crate::config::PatchConfig;
use crate::differ::{Differ, DifferExt};
use crate::error::DiffResult;
use crate::tree::{dismantle, tree_eq, tree_fmt, walk, PatchTree};

const CONTAINER: &str = "or";

/// A change to an [`Either`] whose branches are patched with `LP` and `RP`.
#[derive(Clone)]
pub enum OrPatch<L, R, LP, RP> {
    Empty,
    AndThen(Arc<OrPatch<L, R, LP, RP>>, Arc<OrPatch<L, R, LP, RP>>),
    /// Switch to (or replace) the left branch.
    SetLeft(L),
    /// Switch to (or replace) the right branch.
    SetRight(R),
    /// Patch the left payload; skipped unless the value is currently left.
    UpdateLeft(LP),
    /// Patch the right payload; skipped unless the value is currently right.
    UpdateRight(RP),
}

impl<L, R, LP, RP> OrPatch<L, R, LP, RP> {
    pub fn is_empty(&self) -> bool {
        matches!(self, OrPatch::Empty)
    }

    pub fn and_then(self, that: Self) -> Self {
        if self.is_empty() {
            return that;
        }
        if that.is_empty() {
            return self;
        }
        OrPatch::AndThen(Arc::new(self), Arc::new(that))
    }
}

impl<L, R, LP, RP> PatchTree for OrPatch<L, R, LP, RP> {
    fn vacant() -> Self {
        OrPatch::Empty
    }

    fn children(&self) -> Option<(&Self, &Self)> {
        match self {
            OrPatch::AndThen(first, second) => Some((&**first, &**second)),
            _ => None,
        }
    }

    fn children_mut(&mut self) -> Option<(&mut Arc<Self>, &mut Arc<Self>)> {
        match self {
            OrPatch::AndThen(first, second) => Some((first, second)),
            _ => None,
        }
    }
}

impl<L, R, LP, RP> Drop for OrPatch<L, R, LP, RP> {
    fn drop(&mut self) {
        dismantle(self);
    }
}

impl<L: PartialEq, R: PartialEq, LP: PartialEq, RP: PartialEq> PartialEq for OrPatch<L, R, LP, RP> {
    fn eq(&self, other: &Self) -> bool {
        tree_eq(self, other, |left, right| match (left, right) {
            (OrPatch::Empty, OrPatch::Empty) => true,
            (OrPatch::SetLeft(x), OrPatch::SetLeft(y)) => x == y,
            (OrPatch::SetRight(x), OrPatch::SetRight(y)) => x == y,
            (OrPatch::UpdateLeft(x), OrPatch::UpdateLeft(y)) => x == y,
            (OrPatch::UpdateRight(x), OrPatch::UpdateRight(y)) => x == y,
            _ => false,
        })
    }
}

impl<L, R, LP, RP> fmt::Debug for OrPatch<L, R, LP, RP>
where
    L: fmt::Debug,
    R: fmt::Debug,
    LP: fmt::Debug,
    RP: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        tree_fmt(self, f, |leaf, f| match leaf {
            OrPatch::Empty | OrPatch::AndThen(..) => f.write_str("Empty"),
            OrPatch::SetLeft(value) => f.debug_tuple("SetLeft").field(value).finish(),
            OrPatch::SetRight(value) => f.debug_tuple("SetRight").field(value).finish(),
            OrPatch::UpdateLeft(patch) => f.debug_tuple("UpdateLeft").field(patch).finish(),
            OrPatch::UpdateRight(patch) => f.debug_tuple("UpdateRight").field(patch).finish(),
        })
    }
}

/// Patch type of an [`OrDiffer`] built from `DL` and `DR`.
pub type OrPatchOf<DL, DR> = OrPatch<
    <DL as Differ>::Value,
    <DR as Differ>::Value,
    <DL as Differ>::Patch,
    <DR as Differ>::Patch,
>;

/// Differ for [`Either`], with `left` on the left branch and `right` on the
/// right.
#[derive(Clone, Debug, Default)]
pub struct OrDiffer<DL, DR> {
    left: DL,
    right: DR,
}

impl<DL, DR> OrDiffer<DL, DR> {
    pub fn new(left: DL, right: DR) -> Self {
        Self { left, right }
    }
}

/// A differ for `Either<DL::Value, DR::Value>`.
pub fn or_else_either<DL: Differ, DR: Differ>(left: DL, right: DR) -> OrDiffer<DL, DR> {
    OrDiffer::new(left, right)
}

/// A differ for `Result<A, E>`: `ok` diffs successes, `err` diffs failures.
///
/// Built on [`or_else_either`] with `Ok` on the left branch.
pub fn or_else_result<DA, DE>(
    ok: DA,
    err: DE,
) -> impl Differ<Value = Result<DA::Value, DE::Value>, Patch = OrPatchOf<DA, DE>> + Clone
where
    DA: Differ + Clone,
    DE: Differ + Clone,
{
    or_else_either(ok, err).transform(
        |result: &Result<DA::Value, DE::Value>| Either::from(result.clone()),
        Either::into_result,
    )
}

impl<DL: Differ, DR: Differ> Differ for OrDiffer<DL, DR> {
    type Value = Either<DL::Value, DR::Value>;
    type Patch = OrPatchOf<DL, DR>;

    fn empty(&self) -> Self::Patch {
        OrPatch::Empty
    }

    fn is_empty(&self, patch: &Self::Patch) -> bool {
        patch.is_empty()
    }

    fn diff(&self, old: &Self::Value, new: &Self::Value) -> Self::Patch {
        match (old, new) {
            (Either::Left(before), Either::Left(after)) => {
                let inner = self.left.diff(before, after);
                if self.left.is_empty(&inner) {
                    OrPatch::Empty
                } else {
                    OrPatch::UpdateLeft(inner)
                }
            }
            (Either::Right(before), Either::Right(after)) => {
                let inner = self.right.diff(before, after);
                if self.right.is_empty(&inner) {
                    OrPatch::Empty
                } else {
                    OrPatch::UpdateRight(inner)
                }
            }
            (_, Either::Left(after)) => OrPatch::SetLeft(after.clone()),
            (_, Either::Right(after)) => OrPatch::SetRight(after.clone()),
        }
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
        let mut current = old.clone();

        let instructions = walk(patch, config.worklist_capacity, |node| {
            match node {
                OrPatch::Empty | OrPatch::AndThen(..) => {}
                OrPatch::SetLeft(value) => current = Either::Left(value.clone()),
                OrPatch::SetRight(value) => current = Either::Right(value.clone()),
                OrPatch::UpdateLeft(inner) => match &current {
                    Either::Left(value) => {
                        let next = self.left.apply(inner, value, config)?;
                        current = Either::Left(next);
                    }
                    Either::Right(_) => config.resolve_missing(CONTAINER, "UpdateLeft")?,
                },
                OrPatch::UpdateRight(inner) => match &current {
                    Either::Right(value) => {
                        let next = self.right.apply(inner, value, config)?;
                        current = Either::Right(next);
                    }
                    Either::Left(_) => config.resolve_missing(CONTAINER, "UpdateRight")?,
                },
            }
            Ok(())
        })?;

        debug!(container = CONTAINER, instructions, left = current.is_left(), "applied patch");
        Ok(current)
    }
}

//! Product differ over pairs.

use crate::config::PatchConfig;
use crate::differ::Differ;
use crate::error::DiffResult;

/// Differ for `(A::Value, B::Value)`, diffing each side independently.
#[derive(Clone, Debug, Default)]
pub struct ZipDiffer<A, B> {
    first: A,
    second: B,
}

impl<A, B> ZipDiffer<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

/// A differ for pairs built from one differ per component.
pub fn zip<A: Differ, B: Differ>(first: A, second: B) -> ZipDiffer<A, B> {
    ZipDiffer::new(first, second)
}

impl<A: Differ, B: Differ> Differ for ZipDiffer<A, B> {
    type Value = (A::Value, B::Value);
    type Patch = (A::Patch, B::Patch);

    fn empty(&self) -> Self::Patch {
        (self.first.empty(), self.second.empty())
    }

    fn is_empty(&self, patch: &Self::Patch) -> bool {
        self.first.is_empty(&patch.0) && self.second.is_empty(&patch.1)
    }

    fn diff(&self, old: &Self::Value, new: &Self::Value) -> Self::Patch {
        (
            self.first.diff(&old.0, &new.0),
            self.second.diff(&old.1, &new.1),
        )
    }

    fn combine(&self, first: &Self::Patch, second: &Self::Patch) -> Self::Patch {
        (
            self.first.combine(&first.0, &second.0),
            self.second.combine(&first.1, &second.1),
        )
    }

    fn apply(
        &self,
        patch: &Self::Patch,
        old: &Self::Value,
        config: &PatchConfig,
    ) -> DiffResult<Self::Value> {
        Ok((
            self.first.apply(&patch.0, &old.0, config)?,
            self.second.apply(&patch.1, &old.1, config)?,
        ))
    }
}

//! Differs assembled from caller-supplied functions.

use std::fmt;
use std::sync::Arc;

use crate::config::PatchConfig;
use crate::differ::Differ;
use crate::error::DiffResult;

type DiffFn<V, P> = Arc<dyn Fn(&V, &V) -> P + Send + Sync>;
type CombineFn<P> = Arc<dyn Fn(&P, &P) -> P + Send + Sync>;
type PatchFn<V, P> = Arc<dyn Fn(&P, &V) -> V + Send + Sync>;

/// A differ backed by four primitive functions.
///
/// The functions must satisfy the [`Differ`] laws; nothing here checks
/// them. Emptiness is decided by comparing against the supplied empty
/// patch.
pub struct FnDiffer<V, P> {
    empty: P,
    diff: DiffFn<V, P>,
    combine: CombineFn<P>,
    patch: PatchFn<V, P>,
}

/// Build a custom differ from its primitive operations.
pub fn make<V, P>(
    empty: P,
    diff: impl Fn(&V, &V) -> P + Send + Sync + 'static,
    combine: impl Fn(&P, &P) -> P + Send + Sync + 'static,
    patch: impl Fn(&P, &V) -> V + Send + Sync + 'static,
) -> FnDiffer<V, P>
where
    V: Clone,
    P: Clone + PartialEq,
{
    FnDiffer {
        empty,
        diff: Arc::new(diff),
        combine: Arc::new(combine),
        patch: Arc::new(patch),
    }
}

impl<V, P: Clone> Clone for FnDiffer<V, P> {
    fn clone(&self) -> Self {
        Self {
            empty: self.empty.clone(),
            diff: Arc::clone(&self.diff),
            combine: Arc::clone(&self.combine),
            patch: Arc::clone(&self.patch),
        }
    }
}

impl<V, P: fmt::Debug> fmt::Debug for FnDiffer<V, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnDiffer")
            .field("empty", &self.empty)
            .finish_non_exhaustive()
    }
}

impl<V, P> Differ for FnDiffer<V, P>
where
    V: Clone,
    P: Clone + PartialEq,
{
    type Value = V;
    type Patch = P;

    fn empty(&self) -> P {
        self.empty.clone()
    }

    fn is_empty(&self, patch: &P) -> bool {
        *patch == self.empty
    }

    fn diff(&self, old: &V, new: &V) -> P {
        (self.diff)(old, new)
    }

    fn combine(&self, first: &P, second: &P) -> P {
        (self.combine)(first, second)
    }

    fn apply(&self, patch: &P, old: &V, _config: &PatchConfig) -> DiffResult<V> {
        Ok((self.patch)(patch, old))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::chunk;
    use im::vector;

    /// Counter differ whose patches are additive deltas.
    fn counter() -> FnDiffer<i64, i64> {
        make(
            0,
            |old: &i64, new: &i64| new - old,
            |a: &i64, b: &i64| a + b,
            |delta: &i64, old: &i64| old + delta,
        )
    }

    #[test]
    fn deltas_commute_for_counters() {
        let d = counter();
        let a = d.diff(&10, &13);
        let b = d.diff(&10, &5);
        assert_eq!(d.patch(&d.combine(&a, &b), &10), 8);
        assert_eq!(d.patch(&d.combine(&b, &a), &10), 8);
    }

    #[test]
    fn emptiness_compares_with_supplied_empty() {
        let d = counter();
        assert!(d.is_empty(&d.diff(&4, &4)));
        assert!(!d.is_empty(&1));
    }

    #[test]
    fn custom_differs_nest() {
        let d = chunk(counter());
        let old = vector![1, 2, 3];
        let new = vector![1, 5];
        let p = d.diff(&old, &new);
        assert_eq!(d.patch(&p, &old), new);
    }
}

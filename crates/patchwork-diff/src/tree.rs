//! Shared machinery for `AndThen`-linked instruction trees.
//!
//! Every patch type is a binary tree whose inner nodes are `AndThen` and
//! whose leaves are instructions. Combine chains are caller-controlled and
//! may be arbitrarily deep, so traversal, comparison, hashing, formatting
//! and destruction all run off an explicit heap stack instead of the call
//! stack.

use std::fmt;
use std::hash::Hasher;
use std::sync::Arc;

use crate::error::DiffResult;

/// An instruction tree with `AndThen` inner nodes.
pub(crate) trait PatchTree: Sized {
    /// A leaf with no children, used to hollow out nodes being torn down.
    fn vacant() -> Self;

    /// The `(first, second)` children if this node is an `AndThen`.
    fn children(&self) -> Option<(&Self, &Self)>;

    /// Mutable access to the children if this node is an `AndThen`.
    fn children_mut(&mut self) -> Option<(&mut Arc<Self>, &mut Arc<Self>)>;
}

/// Visit every leaf of `root` in combine order.
///
/// For `AndThen(first, second)` all leaves of `first` are visited before
/// any leaf of `second`. Returns the number of leaves visited.
pub(crate) fn walk<'a, T, F>(root: &'a T, capacity: usize, mut visit: F) -> DiffResult<usize>
where
    T: PatchTree,
    F: FnMut(&'a T) -> DiffResult<()>,
{
    let mut worklist: Vec<&'a T> = Vec::with_capacity(capacity.max(1));
    worklist.push(root);
    let mut visited = 0;

    while let Some(node) = worklist.pop() {
        match node.children() {
            Some((first, second)) => {
                worklist.push(second);
                worklist.push(first);
            }
            None => {
                visited += 1;
                visit(node)?;
            }
        }
    }

    Ok(visited)
}

/// Structural equality of two trees.
///
/// Inner nodes only match inner nodes. `same_leaf` is called for pairs of
/// non-`AndThen` nodes, in combine order, until one pair differs.
pub(crate) fn tree_eq<T, F>(left: &T, right: &T, mut same_leaf: F) -> bool
where
    T: PatchTree,
    F: FnMut(&T, &T) -> bool,
{
    let mut worklist: Vec<(&T, &T)> = vec![(left, right)];

    while let Some((a, b)) = worklist.pop() {
        // Shared subtree.
        if std::ptr::eq(a, b) {
            continue;
        }
        match (a.children(), b.children()) {
            (Some((a_first, a_second)), Some((b_first, b_second))) => {
                worklist.push((a_second, b_second));
                worklist.push((a_first, b_first));
            }
            (None, None) => {
                if !same_leaf(a, b) {
                    return false;
                }
            }
            _ => return false,
        }
    }

    true
}

/// Feed the shape of `root` and each of its leaves to `state`, pre-order.
///
/// Consistent with [`tree_eq`]: equal trees hash equally as long as
/// `hash_leaf` is consistent with the leaf comparison.
pub(crate) fn tree_hash<T, H, F>(root: &T, state: &mut H, mut hash_leaf: F)
where
    T: PatchTree,
    H: Hasher,
    F: FnMut(&T, &mut H),
{
    let mut worklist: Vec<&T> = vec![root];

    while let Some(node) = worklist.pop() {
        match node.children() {
            Some((first, second)) => {
                state.write_u8(1);
                worklist.push(second);
                worklist.push(first);
            }
            None => {
                state.write_u8(0);
                hash_leaf(node, &mut *state);
            }
        }
    }
}

enum FmtStep<'a, T> {
    Node(&'a T),
    Text(&'static str),
}

/// Write `root` as nested `AndThen(first, second)` with `fmt_leaf` for
/// everything else.
pub(crate) fn tree_fmt<T, F>(root: &T, f: &mut fmt::Formatter<'_>, mut fmt_leaf: F) -> fmt::Result
where
    T: PatchTree,
    F: FnMut(&T, &mut fmt::Formatter<'_>) -> fmt::Result,
{
    let mut worklist = vec![FmtStep::Node(root)];

    while let Some(step) = worklist.pop() {
        match step {
            FmtStep::Text(text) => f.write_str(text)?,
            FmtStep::Node(node) => match node.children() {
                Some((first, second)) => {
                    f.write_str("AndThen(")?;
                    worklist.push(FmtStep::Text(")"));
                    worklist.push(FmtStep::Node(second));
                    worklist.push(FmtStep::Text(", "));
                    worklist.push(FmtStep::Node(first));
                }
                None => fmt_leaf(node, &mut *f)?,
            },
        }
    }

    Ok(())
}

/// Tear down the uniquely owned part of a tree without recursion.
///
/// Called from `Drop`. Children still shared with other trees are left
/// alone; their last owner dismantles them.
pub(crate) fn dismantle<T: PatchTree>(root: &mut T) {
    let mut detached: Vec<T> = Vec::new();
    detach_children(root, &mut detached);
    while let Some(mut node) = detached.pop() {
        detach_children(&mut node, &mut detached);
    }
}

fn detach_children<T: PatchTree>(node: &mut T, detached: &mut Vec<T>) {
    if let Some((first, second)) = node.children_mut() {
        for child in [first, second] {
            if let Some(inner) = Arc::get_mut(child) {
                if inner.children().is_some() {
                    detached.push(std::mem::replace(inner, T::vacant()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    enum Node {
        Leaf(u32),
        AndThen(Arc<Node>, Arc<Node>),
    }

    impl PatchTree for Node {
        fn vacant() -> Self {
            Node::Leaf(0)
        }

        fn children(&self) -> Option<(&Self, &Self)> {
            match self {
                Node::AndThen(first, second) => Some((&**first, &**second)),
                Node::Leaf(_) => None,
            }
        }

        fn children_mut(&mut self) -> Option<(&mut Arc<Self>, &mut Arc<Self>)> {
            match self {
                Node::AndThen(first, second) => Some((first, second)),
                Node::Leaf(_) => None,
            }
        }
    }

    impl Drop for Node {
        fn drop(&mut self) {
            dismantle(self);
        }
    }

    impl PartialEq for Node {
        fn eq(&self, other: &Self) -> bool {
            tree_eq(self, other, |a, b| match (a, b) {
                (Node::Leaf(x), Node::Leaf(y)) => x == y,
                _ => false,
            })
        }
    }

    impl std::hash::Hash for Node {
        fn hash<H: Hasher>(&self, state: &mut H) {
            tree_hash(self, state, |leaf, state| {
                if let Node::Leaf(n) = leaf {
                    state.write_u32(*n);
                }
            })
        }
    }

    impl fmt::Debug for Node {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            tree_fmt(self, f, |leaf, f| match leaf {
                Node::Leaf(n) => f.debug_tuple("Leaf").field(n).finish(),
                Node::AndThen(..) => Ok(()),
            })
        }
    }

    fn hash_of(node: &Node) -> u64 {
        use std::hash::Hash;

        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        node.hash(&mut hasher);
        hasher.finish()
    }

    fn leaves(root: &Node) -> Vec<u32> {
        let mut out = Vec::new();
        walk(root, 4, |node| {
            if let Node::Leaf(n) = node {
                out.push(*n);
            }
            Ok(())
        })
        .unwrap();
        out
    }

    fn and_then(first: Node, second: Node) -> Node {
        Node::AndThen(Arc::new(first), Arc::new(second))
    }

    #[test]
    fn single_leaf_is_visited() {
        assert_eq!(leaves(&Node::Leaf(7)), vec![7]);
    }

    #[test]
    fn visits_in_combine_order() {
        let tree = and_then(
            and_then(Node::Leaf(1), Node::Leaf(2)),
            and_then(Node::Leaf(3), and_then(Node::Leaf(4), Node::Leaf(5))),
        );
        assert_eq!(leaves(&tree), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn walk_reports_leaf_count() {
        let tree = and_then(Node::Leaf(1), Node::Leaf(2));
        assert_eq!(walk(&tree, 0, |_| Ok(())).unwrap(), 2);
    }

    #[test]
    fn walk_stops_at_first_error() {
        use crate::error::DiffError;

        let tree = and_then(Node::Leaf(1), and_then(Node::Leaf(2), Node::Leaf(3)));
        let mut seen = Vec::new();
        let result = walk(&tree, 4, |node| {
            if let Node::Leaf(n) = node {
                seen.push(*n);
                if *n == 2 {
                    return Err(DiffError::MissingTarget {
                        container: "test",
                        instruction: "Leaf",
                    });
                }
            }
            Ok(())
        });
        assert!(result.is_err());
        assert_eq!(seen, vec![1, 2]);
    }

    #[test]
    fn deep_chains_walk_and_drop() {
        let mut left = Node::Leaf(0);
        let mut right = Node::Leaf(0);
        for i in 1..=200_000 {
            left = and_then(left, Node::Leaf(i));
            right = and_then(Node::Leaf(i), right);
        }
        assert_eq!(walk(&left, 16, |_| Ok(())).unwrap(), 200_001);
        assert_eq!(walk(&right, 16, |_| Ok(())).unwrap(), 200_001);
        drop(left);
        drop(right);
    }

    #[test]
    fn shared_subtrees_survive_drop() {
        let shared = Arc::new(and_then(Node::Leaf(1), Node::Leaf(2)));
        let outer = Node::AndThen(Arc::clone(&shared), Arc::new(Node::Leaf(3)));
        drop(outer);
        assert_eq!(leaves(&shared), vec![1, 2]);
    }

    #[test]
    fn equality_follows_shape_and_leaves() {
        let a = and_then(Node::Leaf(1), and_then(Node::Leaf(2), Node::Leaf(3)));
        let b = and_then(Node::Leaf(1), and_then(Node::Leaf(2), Node::Leaf(3)));
        let regrouped = and_then(and_then(Node::Leaf(1), Node::Leaf(2)), Node::Leaf(3));
        let changed = and_then(Node::Leaf(1), and_then(Node::Leaf(2), Node::Leaf(4)));
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(a, regrouped);
        assert_ne!(a, changed);
        assert_ne!(a, Node::Leaf(1));
    }

    #[test]
    fn debug_matches_nested_form() {
        let tree = and_then(Node::Leaf(1), and_then(Node::Leaf(2), Node::Leaf(3)));
        assert_eq!(
            format!("{tree:?}"),
            "AndThen(Leaf(1), AndThen(Leaf(2), Leaf(3)))"
        );
    }

    #[test]
    fn deep_chains_compare_hash_and_format() {
        let mut a = Node::Leaf(0);
        let mut b = Node::Leaf(0);
        for i in 1..=200_000 {
            a = and_then(a, Node::Leaf(i));
            b = and_then(b, Node::Leaf(i));
        }
        assert!(a == b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert!(format!("{a:?}").starts_with("AndThen(AndThen("));

        let c = and_then(Node::Leaf(7), a);
        assert!(c != and_then(Node::Leaf(8), b));
    }
}

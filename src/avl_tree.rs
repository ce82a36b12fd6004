//! AVL balancing on top of [`BinarySearchTree`].
//!
//! Every node stores `height(right) - height(left)`. Insert and remove walk
//! upward from the mutation site adjusting those factors and rotate where a
//! factor reaches ±2, so no heights are ever recomputed.

use std::cell::RefCell;
use std::cmp::max;
use std::fmt;
use std::marker::PhantomData;

use crate::bst::{BinarySearchTree, Inserted, Iter};
use crate::config::{ConfigT, DebugConfig, DefaultConfig};
use crate::error::{Error, InvariantViolation};
use crate::node::{Node, NodeId, Side};

pub struct AvlTree<K, V, Config: ConfigT = DefaultConfig> {
    tree: BinarySearchTree<K, V>,
    debug_writer: Option<RefCell<Box<dyn fmt::Write>>>,
    _config: PhantomData<Config>,
}

pub type DebugAvlTree<K, V> = AvlTree<K, V, DebugConfig>;

impl<K, V> AvlTree<K, V> {
    pub fn new() -> Self {
        Self::create()
    }
}

impl<K, V, Config: ConfigT> AvlTree<K, V, Config> {
    pub fn create() -> Self {
        AvlTree {
            tree: BinarySearchTree::new(),
            debug_writer: None,
            _config: PhantomData,
        }
    }

    /// Trace lines go to `writer` instead of stderr. Only written when
    /// `Config::DEBUG` is set.
    pub fn create_with_debug_writer<Writer: fmt::Write + 'static>(writer: Writer) -> Self {
        AvlTree {
            tree: BinarySearchTree::new(),
            debug_writer: Some(RefCell::new(Box::new(writer))),
            _config: PhantomData,
        }
    }

    pub fn as_bst(&self) -> &BinarySearchTree<K, V> {
        &self.tree
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn clear(&mut self) {
        self.tree.clear();
    }

    pub fn root(&self) -> Option<NodeId> {
        self.tree.root()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node<K, V>> {
        self.tree.node(id)
    }

    pub fn predecessor(&self, id: NodeId) -> Option<NodeId> {
        self.tree.predecessor(id)
    }

    pub fn successor(&self, id: NodeId) -> Option<NodeId> {
        self.tree.successor(id)
    }

    pub fn first(&self) -> Option<(&K, &V)> {
        self.tree.first()
    }

    pub fn last(&self) -> Option<(&K, &V)> {
        self.tree.last()
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        self.tree.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.tree.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.tree.values()
    }

    /// -1 for an empty tree.
    pub fn height(&self) -> i32 {
        self.tree.height()
    }

    /// Verifies order, balance, stored balance factors, parent links and the
    /// entry count by walking the whole tree.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation>
    where
        K: Ord,
    {
        let mut reachable = 0;
        if let Some(root) = self.tree.root() {
            if self.tree.parent(root).is_some() {
                return Err(InvariantViolation::BrokenParentLink { node: root });
            }
            self.check_subtree(root, None, None, &mut reachable)?;
        }
        if reachable != self.len() {
            return Err(InvariantViolation::LenMismatch {
                reported: self.len(),
                reachable,
            });
        }
        Ok(())
    }

    fn check_subtree<'a>(
        &'a self,
        id: NodeId,
        lower: Option<&'a K>,
        upper: Option<&'a K>,
        reachable: &mut usize,
    ) -> Result<i32, InvariantViolation>
    where
        K: Ord,
    {
        let node = self
            .tree
            .node(id)
            .ok_or(InvariantViolation::BrokenParentLink { node: id })?;
        *reachable += 1;
        if lower.is_some_and(|lower| node.key() <= lower)
            || upper.is_some_and(|upper| node.key() >= upper)
        {
            return Err(InvariantViolation::Unordered { node: id });
        }

        let mut heights = [-1, -1];
        for (i, child) in [node.left(), node.right()].into_iter().enumerate() {
            let Some(child) = child else { continue };
            if self.tree.parent(child) != Some(id) {
                return Err(InvariantViolation::BrokenParentLink { node: child });
            }
            let (lo, hi) = if i == 0 {
                (lower, Some(node.key()))
            } else {
                (Some(node.key()), upper)
            };
            heights[i] = self.check_subtree(child, lo, hi, reachable)?;
        }

        let diff = heights[1] - heights[0];
        if diff.abs() > 1 {
            return Err(InvariantViolation::Unbalanced { node: id, diff });
        }
        if diff != node.balance() as i32 {
            return Err(InvariantViolation::BalanceDrift {
                node: id,
                stored: node.balance(),
                actual: diff,
            });
        }
        Ok(1 + max(heights[0], heights[1]))
    }

    fn check_after(&self, op: &str)
    where
        K: Ord,
    {
        if Config::CHECK_INVARIANTS {
            if let Err(violation) = self.check_invariants() {
                panic!("invariant violated after {}: {}", op, violation);
            }
        }
    }

    /// Lifts `pivot`'s right child into its place. Balances are left to the
    /// caller.
    fn rotate_left(&mut self, pivot: NodeId) -> NodeId {
        debug!(self.debug_writer, "rotate left at {}", pivot);
        let new_root = self.tree.right(pivot).expect("rotate_left on None");
        let inner = self.tree.left(new_root);
        let position = self.tree.position(pivot);

        self.tree.replace_child(position, Some(new_root));
        self.tree.set_left(new_root, Some(pivot));
        self.tree.set_parent(pivot, Some(new_root));
        self.tree.set_right(pivot, inner);
        if let Some(inner) = inner {
            self.tree.set_parent(inner, Some(pivot));
        }
        new_root
    }

    fn rotate_right(&mut self, pivot: NodeId) -> NodeId {
        debug!(self.debug_writer, "rotate right at {}", pivot);
        let new_root = self.tree.left(pivot).expect("rotate_right on None");
        let inner = self.tree.right(new_root);
        let position = self.tree.position(pivot);

        self.tree.replace_child(position, Some(new_root));
        self.tree.set_right(new_root, Some(pivot));
        self.tree.set_parent(pivot, Some(new_root));
        self.tree.set_left(pivot, inner);
        if let Some(inner) = inner {
            self.tree.set_parent(inner, Some(pivot));
        }
        new_root
    }

    /// Rotates the child on side `lift` up over `pivot`.
    fn rotate(&mut self, pivot: NodeId, lift: Side) -> NodeId {
        match lift {
            Side::Left => self.rotate_right(pivot),
            Side::Right => self.rotate_left(pivot),
        }
    }

    /// Double rotation lifting `grandchild` (the inner child of `child`, which
    /// hangs on the `heavy` side of `top`) over both. Final balances depend on
    /// the grandchild's balance before the rotation.
    fn double_rotate(&mut self, top: NodeId, child: NodeId, heavy: Side) -> NodeId {
        let grandchild = self
            .tree
            .child(child, heavy.reverse())
            .expect("inner grandchild of a double rotation");
        let pivot_balance = self.tree.balance(grandchild);
        self.rotate(child, heavy.reverse());
        self.rotate(top, heavy);

        let d = heavy.balance_delta();
        let (child_balance, top_balance) = match pivot_balance {
            b if b == d => (0, -d),
            b if b == -d => (d, 0),
            _ => (0, 0),
        };
        self.tree.set_balance(child, child_balance);
        self.tree.set_balance(top, top_balance);
        self.tree.set_balance(grandchild, 0);
        grandchild
    }

    /// Position swap that also trades balance factors, since a balance factor
    /// describes the position and not the key.
    fn node_swap(&mut self, a: NodeId, b: NodeId) {
        self.tree.node_swap(a, b);
        let (balance_a, balance_b) = (self.tree.balance(a), self.tree.balance(b));
        self.tree.set_balance(a, balance_b);
        self.tree.set_balance(b, balance_a);
    }

    fn insert_fix(&mut self, new: NodeId) {
        let mut child = new;
        while let Some((parent, side)) = self.tree.position(child) {
            let balance = self.tree.balance(parent) + side.balance_delta();
            match balance {
                0 => {
                    self.tree.set_balance(parent, 0);
                    debug!(self.debug_writer, "{}: balance 0, stop", parent);
                    return;
                }
                -1 | 1 => {
                    self.tree.set_balance(parent, balance);
                    debug!(self.debug_writer, "{}: balance {}, height grew", parent, balance);
                    child = parent;
                }
                _ => {
                    debug!(self.debug_writer, "{}: balance {}, rotating", parent, balance);
                    // `child` grew, so it leans to the side it grew on; leaning
                    // the same way as `parent` means an outer case.
                    if self.tree.balance(child) == side.balance_delta() {
                        self.rotate(parent, side);
                        self.tree.set_balance(parent, 0);
                        self.tree.set_balance(child, 0);
                    } else {
                        self.double_rotate(parent, child, side);
                    }
                    return;
                }
            }
        }
    }

    /// `diff` is the balance change of `node` caused by one of its subtrees
    /// shrinking: +1 when the left side shrank, -1 for the right side.
    fn remove_fix(&mut self, mut node: NodeId, mut diff: i8) {
        loop {
            let position = self.tree.position(node);
            let balance = self.tree.balance(node) + diff;
            let subtree_root = match balance {
                -1 | 1 => {
                    self.tree.set_balance(node, balance);
                    debug!(self.debug_writer, "{}: balance {}, stop", node, balance);
                    return;
                }
                0 => {
                    self.tree.set_balance(node, 0);
                    debug!(self.debug_writer, "{}: balance 0, height shrank", node);
                    node
                }
                _ => {
                    debug!(self.debug_writer, "{}: balance {}, rotating", node, balance);
                    let heavy = if balance > 0 { Side::Right } else { Side::Left };
                    let d = heavy.balance_delta();
                    let sibling = self
                        .tree
                        .child(node, heavy)
                        .expect("heavy side of an unbalanced node is non-empty");
                    let sibling_balance = self.tree.balance(sibling);
                    if sibling_balance == 0 {
                        // height unchanged
                        self.rotate(node, heavy);
                        self.tree.set_balance(sibling, -d);
                        self.tree.set_balance(node, d);
                        return;
                    } else if sibling_balance == d {
                        self.rotate(node, heavy);
                        self.tree.set_balance(sibling, 0);
                        self.tree.set_balance(node, 0);
                        sibling
                    } else {
                        self.double_rotate(node, sibling, heavy)
                    }
                }
            };
            match position {
                None => return,
                Some((parent, side)) => {
                    debug!(self.debug_writer, "{}: subtree shrank under {}", subtree_root, parent);
                    node = parent;
                    diff = -side.balance_delta();
                }
            }
        }
    }
}

impl<K: Ord, V, Config: ConfigT> AvlTree<K, V, Config> {
    pub fn find_node(&self, key: &K) -> Option<NodeId> {
        self.tree.find_node(key)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.tree.get(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.tree.get_mut(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.tree.contains_key(key)
    }

    pub fn at(&self, key: &K) -> Result<&V, Error> {
        self.tree.at(key)
    }

    /// Inserts or overwrites. Returns the previous value of an existing key;
    /// overwriting never changes the tree's shape.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let replaced = match self.tree.insert(key, value) {
            Inserted::Replaced(_, old) => Some(old),
            Inserted::Attached(id) => {
                debug!(self.debug_writer, "attached {}", id);
                self.insert_fix(id);
                None
            }
        };
        self.check_after("insert");
        replaced
    }

    /// Removes `key` if present. A node with two children first trades places
    /// with its in-order predecessor, so the node actually unlinked has at
    /// most one child.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let target = self.tree.find_node(key)?;
        if self.tree.left(target).is_some() && self.tree.right(target).is_some() {
            let pred = self
                .tree
                .predecessor(target)
                .expect("node with a left child has a predecessor");
            debug!(self.debug_writer, "swap {} with predecessor {}", target, pred);
            self.node_swap(target, pred);
        }

        let (node, position) = self.tree.splice_out(target);
        debug!(self.debug_writer, "spliced out {}", target);
        if let Some((parent, side)) = position {
            self.remove_fix(parent, -side.balance_delta());
        }
        self.check_after("remove");
        Some(node.into_entry().1)
    }
}

impl<K, V, Config: ConfigT> Default for AvlTree<K, V, Config> {
    fn default() -> Self {
        Self::create()
    }
}

impl<K: Ord, V, Config: ConfigT> FromIterator<(K, V)> for AvlTree<K, V, Config> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::create();
        tree.extend(iter);
        tree
    }
}

impl<K: Ord, V, Config: ConfigT> Extend<(K, V)> for AvlTree<K, V, Config> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, K, V, Config: ConfigT> IntoIterator for &'a AvlTree<K, V, Config> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, Config: ConfigT> fmt::Debug for AvlTree<K, V, Config> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.tree, f)
    }
}

/// Sideways dump: in-order, one node per line, two spaces of indent per
/// level, `key: value [balance]`.
impl<K: fmt::Display, V: fmt::Display, Config: ConfigT> fmt::Display for AvlTree<K, V, Config> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn subtree<K: fmt::Display, V: fmt::Display>(
            tree: &BinarySearchTree<K, V>,
            link: Option<NodeId>,
            level: usize,
            f: &mut fmt::Formatter<'_>,
        ) -> fmt::Result {
            let Some(node) = link.and_then(|id| tree.node(id)) else {
                return Ok(());
            };
            subtree(tree, node.left(), level + 1, f)?;
            writeln!(
                f,
                "{}{}: {} [{}]",
                "  ".repeat(level),
                node.key(),
                node.value(),
                node.balance()
            )?;
            subtree(tree, node.right(), level + 1, f)
        }
        subtree(&self.tree, self.tree.root(), 0, f)
    }
}

impl<K: fmt::Display, V: fmt::Display, Config: ConfigT> AvlTree<K, V, Config> {
    pub fn render(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use expect_test::expect;

    use crate::trace::TraceBuffer;

    fn build(keys: &[i32]) -> DebugAvlTree<i32, i32> {
        let mut tree = DebugAvlTree::create();
        for &k in keys {
            tree.insert(k, k * 10);
        }
        tree
    }

    #[test]
    fn ascending_insert_rotates_left() {
        let mut tree = DebugAvlTree::create();
        tree.insert(1, "a");
        tree.insert(2, "b");
        tree.insert(3, "c");
        let expect = expect![[r#"
              1: a [0]
            2: b [0]
              3: c [0]
        "#]];
        expect.assert_eq(&tree.render());
    }

    #[test]
    fn zigzag_insert_double_rotates() {
        let tree = build(&[3, 1, 2]);
        let expect = expect![[r#"
              1: 10 [0]
            2: 20 [0]
              3: 30 [0]
        "#]];
        expect.assert_eq(&tree.render());
        assert_eq!(tree.node(tree.root().unwrap()).unwrap().key(), &2);
    }

    #[test]
    fn remove_root_of_complete_tree() {
        let mut tree = build(&[4, 2, 6, 1, 3, 5, 7]);
        let n3 = tree.find_node(&3).unwrap();
        assert_eq!(tree.remove(&4), Some(40));
        assert_eq!(tree.root(), Some(n3));
        let expect = expect![[r#"
                1: 10 [0]
              2: 20 [-1]
            3: 30 [0]
                5: 50 [0]
              6: 60 [0]
                7: 70 [0]
        "#]];
        expect.assert_eq(&tree.render());
    }

    #[test]
    fn remove_with_level_sibling_single_rotation_stops() {
        let mut tree = build(&[2, 1, 4, 3, 5]);
        tree.remove(&1);
        let expect = expect![[r#"
              2: 20 [1]
                3: 30 [0]
            4: 40 [-1]
              5: 50 [0]
        "#]];
        expect.assert_eq(&tree.render());
    }

    #[test]
    fn remove_with_outer_sibling_single_rotation() {
        let mut tree = build(&[2, 1, 3, 4]);
        tree.remove(&1);
        let expect = expect![[r#"
              2: 20 [0]
            3: 30 [0]
              4: 40 [0]
        "#]];
        expect.assert_eq(&tree.render());
    }

    #[test]
    fn remove_with_inner_nephew_double_rotation() {
        let mut tree = build(&[2, 1, 4, 3]);
        tree.remove(&1);
        let expect = expect![[r#"
              2: 20 [0]
            3: 30 [0]
              4: 40 [0]
        "#]];
        expect.assert_eq(&tree.render());
    }

    #[test]
    fn remove_double_rotation_with_left_heavy_nephew() {
        let mut tree = build(&[2, 1, 5, 0, 4, 6, 3]);
        tree.remove(&0);
        tree.check_invariants().unwrap();
        let expect = expect![[r#"
                1: 10 [0]
              2: 20 [0]
                3: 30 [0]
            4: 40 [0]
              5: 50 [1]
                6: 60 [0]
        "#]];
        expect.assert_eq(&tree.render());
    }

    #[test]
    fn remove_double_rotation_with_right_heavy_nephew() {
        let mut tree = build(&[2, 1, 6, 0, 4, 7, 5]);
        tree.remove(&0);
        tree.check_invariants().unwrap();
        let expect = expect![[r#"
                1: 10 [0]
              2: 20 [-1]
            4: 40 [0]
                5: 50 [0]
              6: 60 [0]
                7: 70 [0]
        "#]];
        expect.assert_eq(&tree.render());
    }

    #[test]
    fn overwrite_keeps_shape() {
        let mut tree = build(&[5, 3, 8, 1]);
        let before = tree.render();
        assert_eq!(tree.insert(3, 99), Some(30));
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.render(), before.replace("3: 30", "3: 99"));
    }

    #[test]
    fn removing_absent_key_is_noop() {
        let mut tree = build(&[5, 3, 8, 1]);
        let before = tree.render();
        assert_eq!(tree.remove(&4), None);
        assert_eq!(tree.render(), before);
        let mut empty: AvlTree<i32, i32> = AvlTree::new();
        assert_eq!(empty.remove(&4), None);
        assert!(empty.is_empty());
    }

    #[test]
    fn leaf_insert_then_remove_restores_tree() {
        let mut tree = build(&[4, 2, 6, 1, 3, 5, 7]);
        let before = tree.render();
        tree.insert(8, 80);
        assert_ne!(tree.render(), before);
        tree.remove(&8);
        assert_eq!(tree.render(), before);
        tree.insert(0, 0);
        tree.remove(&0);
        assert_eq!(tree.render(), before);
    }

    #[test]
    fn at_signals_missing_key() {
        let tree = build(&[1, 2]);
        assert_eq!(tree.at(&2), Ok(&20));
        assert_eq!(tree.at(&3), Err(Error::KeyNotFound));
    }

    #[test]
    fn removed_handles_are_stale() {
        let mut tree = build(&[4, 2, 6]);
        let n4 = tree.find_node(&4).unwrap();
        tree.remove(&4);
        assert!(tree.node(n4).is_none());
        tree.insert(4, 40);
        assert!(tree.node(n4).is_none());
        assert_eq!(tree.get(&4), Some(&40));
    }

    #[test]
    fn clear_invalidates_handles_and_tree_refills() {
        let mut tree = build(&[4, 2, 6, 1]);
        let ids: Vec<_> = [4, 2, 6, 1]
            .iter()
            .map(|k| tree.find_node(k).unwrap())
            .collect();
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.height(), -1);
        assert!(tree.check_invariants().is_ok());
        assert!(ids.iter().all(|&id| tree.node(id).is_none()));

        for k in 10..20 {
            tree.insert(k, k * 10);
        }
        assert!(ids.iter().all(|&id| tree.node(id).is_none()));
        assert_eq!(tree.len(), 10);
        assert_eq!(tree.height(), 3);
        assert!(tree.check_invariants().is_ok());
        assert_eq!(tree.get(&15), Some(&150));
    }

    #[test]
    fn trace_records_fixup_and_rotations() {
        let trace = TraceBuffer::new();
        let mut tree = DebugAvlTree::create_with_debug_writer(trace.clone());
        tree.insert(3, ());
        tree.insert(1, ());
        tree.insert(2, ());
        let expect = expect![[r#"
            attached #0
            attached #1
            #0: balance -1, height grew
            attached #2
            #1: balance 1, height grew
            #0: balance -2, rotating
            rotate left at #1
            rotate right at #0
        "#]];
        expect.assert_eq(&trace.take());

        tree.remove(&2);
        let expect = expect![[r#"
            swap #2 with predecessor #1
            spliced out #2
            #1: balance 1, stop
        "#]];
        expect.assert_eq(&trace.take());
    }

    #[test]
    fn check_invariants_catches_drift() {
        let mut tree = build(&[2, 1, 3]);
        let root = tree.root().unwrap();
        tree.tree.set_balance(root, 1);
        assert_eq!(
            tree.check_invariants(),
            Err(InvariantViolation::BalanceDrift {
                node: root,
                stored: 1,
                actual: 0
            })
        );
    }

    #[test]
    fn check_invariants_catches_disorder() {
        let mut tree: AvlTree<i32, ()> = AvlTree::new();
        tree.extend([(2, ()), (1, ()), (3, ())]);
        let n1 = tree.find_node(&1).unwrap();
        let n3 = tree.find_node(&3).unwrap();
        tree.tree.node_swap(n1, n3);
        assert!(matches!(
            tree.check_invariants(),
            Err(InvariantViolation::Unordered { .. })
        ));
    }
}

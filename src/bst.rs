//! Unbalanced binary search tree over an index arena.
//!
//! Nodes carry parent links so the tree can be walked upward. The balancing
//! engine in [`crate::avl_tree`] drives the crate-visible structural mutators
//! directly; outside the crate the tree only exposes read access to links.

use std::cmp::{max, Ordering};
use std::fmt;

use crate::error::Error;
use crate::node::{Node, NodeId, Side};
use crate::pool::NodePool;

/// Where a node hangs: its parent and which child of the parent it is.
/// `None` is the root position.
pub type Position = Option<(NodeId, Side)>;

#[derive(Debug, PartialEq, Eq)]
pub enum Inserted<V> {
    /// The key was present; holds the node and the value it used to have.
    Replaced(NodeId, V),
    /// A new leaf was attached.
    Attached(NodeId),
}

pub struct BinarySearchTree<K, V> {
    pool: NodePool<K, V>,
    root: Option<NodeId>,
}

impl<K, V> BinarySearchTree<K, V> {
    pub fn new() -> Self {
        BinarySearchTree {
            pool: NodePool::new(),
            root: None,
        }
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn clear(&mut self) {
        self.pool.clear();
        self.root = None;
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Resolves a handle. Returns `None` for handles of removed nodes.
    pub fn node(&self, id: NodeId) -> Option<&Node<K, V>> {
        self.pool.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node<K, V>> {
        self.pool.get_mut(id)
    }

    pub fn left(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(Node::left)
    }

    pub fn right(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(Node::right)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(Node::parent)
    }

    /// Which child of its parent `id` is; `None` for the root.
    pub fn side_of(&self, id: NodeId) -> Option<Side> {
        self.position(id).map(|(_, side)| side)
    }

    pub fn position(&self, id: NodeId) -> Position {
        let parent = self.node(id)?.parent?;
        if self.pool[parent].left == Some(id) {
            Some((parent, Side::Left))
        } else {
            debug_assert_eq!(self.pool[parent].right, Some(id));
            Some((parent, Side::Right))
        }
    }

    pub(crate) fn leftmost(&self, mut id: NodeId) -> NodeId {
        while let Some(left) = self.pool[id].left {
            id = left;
        }
        id
    }

    pub(crate) fn rightmost(&self, mut id: NodeId) -> NodeId {
        while let Some(right) = self.pool[id].right {
            id = right;
        }
        id
    }

    /// The node holding the largest key smaller than `id`'s key.
    pub fn predecessor(&self, id: NodeId) -> Option<NodeId> {
        if let Some(left) = self.node(id)?.left {
            return Some(self.rightmost(left));
        }
        let mut cur = id;
        loop {
            let parent = self.pool[cur].parent?;
            if self.pool[parent].right == Some(cur) {
                return Some(parent);
            }
            cur = parent;
        }
    }

    pub fn successor(&self, id: NodeId) -> Option<NodeId> {
        if let Some(right) = self.node(id)?.right {
            return Some(self.leftmost(right));
        }
        let mut cur = id;
        loop {
            let parent = self.pool[cur].parent?;
            if self.pool[parent].left == Some(cur) {
                return Some(parent);
            }
            cur = parent;
        }
    }

    pub fn first(&self) -> Option<(&K, &V)> {
        let node = &self.pool[self.leftmost(self.root?)];
        Some((&node.key, &node.value))
    }

    pub fn last(&self) -> Option<(&K, &V)> {
        let node = &self.pool[self.rightmost(self.root?)];
        Some((&node.key, &node.value))
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            tree: self,
            next: self.root.map(|root| self.leftmost(root)),
            remaining: self.len(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Height of the whole tree; -1 when empty.
    pub fn height(&self) -> i32 {
        self.subtree_height(self.root)
    }

    pub fn subtree_height(&self, link: Option<NodeId>) -> i32 {
        match link.and_then(|id| self.node(id)) {
            None => -1,
            Some(node) => {
                1 + max(
                    self.subtree_height(node.left),
                    self.subtree_height(node.right),
                )
            }
        }
    }

    /// Checks the AVL height condition from scratch, ignoring stored balances.
    pub fn is_balanced(&self) -> bool {
        fn balanced_height<K, V>(tree: &BinarySearchTree<K, V>, link: Option<NodeId>) -> Option<i32> {
            match link {
                None => Some(-1),
                Some(id) => {
                    let lh = balanced_height(tree, tree.pool[id].left)?;
                    let rh = balanced_height(tree, tree.pool[id].right)?;
                    if (lh - rh).abs() > 1 {
                        None
                    } else {
                        Some(1 + max(lh, rh))
                    }
                }
            }
        }
        balanced_height(self, self.root).is_some()
    }

    pub(crate) fn balance(&self, id: NodeId) -> i8 {
        self.pool[id].balance
    }

    pub(crate) fn set_balance(&mut self, id: NodeId, balance: i8) {
        self.pool[id].balance = balance;
    }

    pub(crate) fn child(&self, id: NodeId, side: Side) -> Option<NodeId> {
        self.pool[id].child(side)
    }

    pub(crate) fn set_left(&mut self, id: NodeId, child: Option<NodeId>) {
        self.pool[id].left = child;
    }

    pub(crate) fn set_right(&mut self, id: NodeId, child: Option<NodeId>) {
        self.pool[id].right = child;
    }

    pub(crate) fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        self.pool[id].parent = parent;
    }

    pub(crate) fn set_child(&mut self, id: NodeId, side: Side, child: Option<NodeId>) {
        self.pool[id].set_child(side, child);
    }

    pub(crate) fn set_root(&mut self, root: Option<NodeId>) {
        self.root = root;
    }

    /// Hangs `new` at `position`, fixing both the downward and upward link.
    pub(crate) fn replace_child(&mut self, position: Position, new: Option<NodeId>) {
        match position {
            None => self.set_root(new),
            Some((parent, side)) => self.set_child(parent, side, new),
        }
        if let Some(new) = new {
            self.set_parent(new, position.map(|(parent, _)| parent));
        }
    }

    pub(crate) fn attach(&mut self, position: Position, key: K, value: V) -> NodeId {
        let id = self
            .pool
            .alloc(Node::new(key, value, position.map(|(parent, _)| parent)));
        self.replace_child(position, Some(id));
        id
    }

    /// Unlinks a node with at most one child, hoisting that child into its
    /// place, and frees it. Returns the node and the position it occupied.
    pub(crate) fn splice_out(&mut self, id: NodeId) -> (Node<K, V>, Position) {
        let node = &self.pool[id];
        assert!(
            node.left.is_none() || node.right.is_none(),
            "splice_out on node {} with two children",
            id
        );
        let child = node.left.or(node.right);
        let position = self.position(id);
        self.replace_child(position, child);
        (self.pool.free(id), position)
    }

    /// Exchanges the positions of two nodes by relinking, so each handle keeps
    /// its key and value. Works for adjacent nodes too.
    pub(crate) fn node_swap(&mut self, a: NodeId, b: NodeId) {
        if a == b {
            return;
        }
        let a_position = self.position(a);
        let b_position = self.position(b);
        let remap = |link: Option<NodeId>| match link {
            Some(n) if n == a => Some(b),
            Some(n) if n == b => Some(a),
            other => other,
        };

        let (ap, al, ar) = {
            let n = &self.pool[a];
            (n.parent, n.left, n.right)
        };
        let (bp, bl, br) = {
            let n = &self.pool[b];
            (n.parent, n.left, n.right)
        };
        {
            let n = &mut self.pool[a];
            n.parent = remap(bp);
            n.left = remap(bl);
            n.right = remap(br);
        }
        {
            let n = &mut self.pool[b];
            n.parent = remap(ap);
            n.left = remap(al);
            n.right = remap(ar);
        }

        for (id, position) in [(a, b_position), (b, a_position)] {
            match position {
                None => self.set_root(Some(id)),
                // already relinked through `remap`
                Some((parent, _)) if parent == a || parent == b => {}
                Some((parent, side)) => self.set_child(parent, side, Some(id)),
            }
            for child in [self.pool[id].left, self.pool[id].right].into_iter().flatten() {
                if child != a && child != b {
                    self.set_parent(child, Some(id));
                }
            }
        }
    }
}

impl<K: Ord, V> BinarySearchTree<K, V> {
    /// Descends from the root. `Ok` holds the node with `key`, `Err` the
    /// position a new node with `key` would take.
    pub fn search(&self, key: &K) -> Result<NodeId, Position> {
        let mut cur = self.root;
        let mut position = None;
        while let Some(id) = cur {
            let node = &self.pool[id];
            match key.cmp(&node.key) {
                Ordering::Less => {
                    position = Some((id, Side::Left));
                    cur = node.left;
                }
                Ordering::Greater => {
                    position = Some((id, Side::Right));
                    cur = node.right;
                }
                Ordering::Equal => return Ok(id),
            }
        }
        Err(position)
    }

    pub fn find_node(&self, key: &K) -> Option<NodeId> {
        self.search(key).ok()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.find_node(key).map(|id| &self.pool[id].value)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let id = self.find_node(key)?;
        Some(&mut self.pool[id].value)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.find_node(key).is_some()
    }

    /// Like [`get`](Self::get) but reports a missing key as an error.
    pub fn at(&self, key: &K) -> Result<&V, Error> {
        self.get(key).ok_or(Error::KeyNotFound)
    }

    /// Plain BST insert; no rebalancing.
    pub fn insert(&mut self, key: K, value: V) -> Inserted<V> {
        match self.search(&key) {
            Ok(id) => Inserted::Replaced(id, std::mem::replace(&mut self.pool[id].value, value)),
            Err(position) => Inserted::Attached(self.attach(position, key, value)),
        }
    }

    /// Plain BST remove; a node with two children first trades places with
    /// its predecessor. No rebalancing.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let target = self.find_node(key)?;
        if self.pool[target].left.is_some() && self.pool[target].right.is_some() {
            let pred = self
                .predecessor(target)
                .expect("node with a left child has a predecessor");
            self.node_swap(target, pred);
        }
        let (node, _) = self.splice_out(target);
        Some(node.into_entry().1)
    }
}

impl<K, V> Default for BinarySearchTree<K, V> {
    fn default() -> Self {
        BinarySearchTree::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for BinarySearchTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// In-order iterator, stepping through successor links.
pub struct Iter<'a, K, V> {
    tree: &'a BinarySearchTree<K, V>,
    next: Option<NodeId>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.tree.successor(id);
        self.remaining -= 1;
        let node = &self.tree.pool[id];
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K, V> IntoIterator for &'a BinarySearchTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

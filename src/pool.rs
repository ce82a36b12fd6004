use crate::node::{Node, NodeId};
use crate::slot::Slot;

/// Arena holding every node of one tree. Freed slots are chained through
/// `first_vacant` and reused before the arena grows.
pub struct NodePool<K, V> {
    slots: Vec<Slot<Node<K, V>>>,
    first_vacant: Option<usize>,
    len: usize,
}

impl<K, V> NodePool<K, V> {
    pub fn new() -> Self {
        NodePool {
            slots: Vec::new(),
            first_vacant: None,
            len: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        NodePool {
            slots: Vec::with_capacity(capacity),
            first_vacant: None,
            len: 0,
        }
    }

    pub fn alloc(&mut self, node: Node<K, V>) -> NodeId {
        self.len += 1;
        match self.first_vacant {
            Some(index) => {
                let slot = &mut self.slots[index];
                self.first_vacant = slot.next_vacant_exn();
                let generation = slot.generation();
                *slot = Slot::new(generation, node);
                NodeId { index, generation }
            }
            None => {
                let index = self.slots.len();
                self.slots.push(Slot::new(0, node));
                NodeId {
                    index,
                    generation: 0,
                }
            }
        }
    }

    pub fn free(&mut self, id: NodeId) -> Node<K, V> {
        assert!(self.contains(id), "freeing stale node {}", id);
        let node = self.slots[id.index]
            .vacate(self.first_vacant)
            .expect("slot checked occupied");
        self.first_vacant = Some(id.index);
        self.len -= 1;
        node
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.slots
            .get(id.index)
            .is_some_and(|slot| slot.is_occupied() && slot.generation() == id.generation)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node<K, V>> {
        if self.contains(id) {
            self.slots[id.index].value()
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node<K, V>> {
        if self.contains(id) {
            self.slots[id.index].value_mut()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Vacates every occupied slot instead of dropping the slots, so the
    /// generations survive and handles taken before the clear stay stale.
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.is_occupied() {
                slot.vacate(self.first_vacant);
                self.first_vacant = Some(index);
            }
        }
        self.len = 0;
    }
}

impl<K, V> std::ops::Index<NodeId> for NodePool<K, V> {
    type Output = Node<K, V>;

    fn index(&self, id: NodeId) -> &Self::Output {
        debug_assert_eq!(self.slots[id.index].generation(), id.generation);
        self.slots[id.index].value_exn()
    }
}

impl<K, V> std::ops::IndexMut<NodeId> for NodePool<K, V> {
    fn index_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        debug_assert_eq!(self.slots[id.index].generation(), id.generation);
        self.slots[id.index].value_mut_exn()
    }
}

impl<K, V> Default for NodePool<K, V> {
    fn default() -> Self {
        NodePool::new()
    }
}

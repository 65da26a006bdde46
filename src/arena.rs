//! Slot arena backing the tree's nodes.
//!
//! Nodes live in a `Vec` of slots and are addressed by `u32` indices, the same
//! way the tree links them. Public handles pair the index with the slot's
//! generation, which is bumped every time the slot is released, so a handle to
//! a freed node can never reach whatever reuses the slot later. Each arena
//! also stamps its handles with its own id, so a handle from one tree is
//! rejected by every other tree.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU32, Ordering};

pub(crate) type Link = Option<u32>;

static NEXT_ARENA: AtomicU32 = AtomicU32::new(0);

fn next_arena_id() -> u32 {
    NEXT_ARENA.fetch_add(1, Ordering::Relaxed)
}

/// Handle to a node allocated from a [`SplayTree`](crate::SplayTree).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    arena: u32,
    index: u32,
    generation: u32,
}

impl NodeId {
    #[inline]
    pub(crate) fn index(self) -> u32 {
        self.index
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Node<K, V> {
    pub(crate) key: Option<K>,
    pub(crate) data: Option<V>,
    pub(crate) left: Link,
    pub(crate) right: Link,
    /// Set between a successful insert and the matching remove.
    pub(crate) linked: bool,
}

impl<K, V> Node<K, V> {
    fn vacant() -> Self {
        Self {
            key: None,
            data: None,
            left: None,
            right: None,
            linked: false,
        }
    }
}

#[derive(Clone, Debug)]
struct Slot<K, V> {
    generation: u32,
    node: Option<Node<K, V>>,
}

/// Node arena with a single free list of released slot indices.
#[derive(Debug)]
pub(crate) struct NodeArena<K, V> {
    id: u32,
    slots: Vec<Slot<K, V>>,
    free: Vec<u32>,
    live: usize,
    limit: Option<usize>,
}

impl<K, V> NodeArena<K, V> {
    pub(crate) fn new(capacity: usize, limit: Option<usize>) -> Self {
        Self {
            id: next_arena_id(),
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            live: 0,
            limit,
        }
    }

    /// Number of allocated (not yet released) nodes, linked or not.
    #[inline]
    pub(crate) fn live(&self) -> usize {
        self.live
    }

    pub(crate) fn memory_usage(&self) -> usize {
        self.slots.capacity() * std::mem::size_of::<Slot<K, V>>()
            + self.free.capacity() * std::mem::size_of::<u32>()
    }

    /// Slot addressed by `id`, if `id` was issued by this arena for the
    /// slot's current generation.
    #[inline]
    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Slot<K, V>> {
        if id.arena != self.id {
            return None;
        }
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
    }

    pub(crate) fn alloc(&mut self) -> Option<NodeId> {
        if self.limit.is_some_and(|limit| self.live >= limit) {
            return None;
        }

        let index = if let Some(index) = self.free.pop() {
            index
        } else {
            let index = u32::try_from(self.slots.len()).ok()?;
            self.slots.push(Slot {
                generation: 0,
                node: None,
            });
            index
        };

        let slot = &mut self.slots[index as usize];
        debug_assert!(slot.node.is_none());
        slot.node = Some(Node::vacant());
        self.live += 1;
        Some(NodeId {
            arena: self.id,
            index,
            generation: slot.generation,
        })
    }

    /// Releases the slot and returns its node; the handle is dead afterwards.
    pub(crate) fn release(&mut self, id: NodeId) -> Option<Node<K, V>> {
        let slot = self.slot_mut(id)?;
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        Some(node)
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> Option<&Node<K, V>> {
        if id.arena != self.id {
            return None;
        }
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node<K, V>> {
        self.slot_mut(id)?.node.as_mut()
    }

    /// Node at a link target. Links only ever point at occupied slots.
    #[inline]
    pub(crate) fn node(&self, index: u32) -> &Node<K, V> {
        self.slots[index as usize]
            .node
            .as_ref()
            .expect("tree link points at a vacant slot")
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, index: u32) -> &mut Node<K, V> {
        self.slots[index as usize]
            .node
            .as_mut()
            .expect("tree link points at a vacant slot")
    }

    #[inline]
    pub(crate) fn id_of(&self, index: u32) -> NodeId {
        NodeId {
            arena: self.id,
            index,
            generation: self.slots[index as usize].generation,
        }
    }
}

// A copy gets its own id: handles stay tied to the arena that issued them.
impl<K: Clone, V: Clone> Clone for NodeArena<K, V> {
    fn clone(&self) -> Self {
        Self {
            id: next_arena_id(),
            slots: self.slots.clone(),
            free: self.free.clone(),
            live: self.live,
            limit: self.limit,
        }
    }
}

/// Zero-filled buffer attached to a node by
/// [`SplayTree::alloc_block`](crate::SplayTree::alloc_block).
///
/// The buffer belongs to whoever holds the node's data: releasing the node
/// with [`SplayTree::free_node`](crate::SplayTree::free_node) hands it back
/// rather than destroying it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payload(Box<[u8]>);

impl Payload {
    /// Allocates `size` zero bytes, or `None` if the allocator refuses.
    pub fn zeroed(size: usize) -> Option<Self> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(size).ok()?;
        buf.resize(size, 0);
        Some(Self(buf.into_boxed_slice()))
    }

    pub fn into_inner(self) -> Box<[u8]> {
        self.0
    }
}

impl Deref for Payload {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl DerefMut for Payload {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

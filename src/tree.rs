use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;

use crate::arena::{Link, Node, NodeArena, NodeId, Payload};
use crate::compare::{ByteOrder, Comparator};
use crate::config::TreeConfig;
use crate::error::{Result, TreeError};
use crate::stats::SplayStats;

/// A self-adjusting binary search tree used as an ordered symbol table.
///
/// Nodes are allocated from the tree's own arena, given a key (and optionally
/// data), then linked in with [`insert`](Self::insert). Every lookup splays the
/// node it ends on to the root, so hot keys stay near the top.
///
/// ```rust
/// use splay_symtab::SplayTree;
///
/// let mut tree: SplayTree<&str, u32> = SplayTree::new();
/// let id = tree.insert_entry("goto-line", 1).unwrap();
/// tree.insert_entry("goto-mark", 2).unwrap();
///
/// assert_eq!(tree.lookup("goto-line"), Some(id));
/// assert_eq!(tree.root(), Some(id));
/// assert_eq!(tree.data(id), Some(&1));
/// ```
#[derive(Clone)]
pub struct SplayTree<K, V, C = ByteOrder> {
    pub(crate) nodes: NodeArena<K, V>,
    pub(crate) root: Link,
    count: usize,
    /// Successful insertions, drives the forced splay.
    inserted: usize,
    cmp: C,
    config: TreeConfig,
    pub(crate) stats: SplayStats,
}

// =============================================================================
// Lifecycle
// =============================================================================

impl<K, V> SplayTree<K, V, ByteOrder> {
    pub fn new() -> Self {
        Self::with_comparator(ByteOrder)
    }
}

impl<K, V> Default for SplayTree<K, V, ByteOrder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C> SplayTree<K, V, C> {
    pub fn with_comparator(cmp: C) -> Self {
        Self::with_config(TreeConfig::default(), cmp)
    }

    pub fn with_config(config: TreeConfig, cmp: C) -> Self {
        Self {
            nodes: NodeArena::new(config.initial_capacity, config.node_limit),
            root: None,
            count: 0,
            inserted: 0,
            cmp,
            config,
            stats: SplayStats::default(),
        }
    }

    /// Releases the tree. Whatever is still allocated goes with it; drain
    /// first with [`zap_with`](Self::zap_with) to see each entry on the way out.
    pub fn free(self) {
        tracing::debug!(
            linked = self.count,
            allocated = self.nodes.live(),
            "freeing splay tree"
        );
    }

    /// Allocates an unlinked node with no key and no data.
    ///
    /// Returns `None` when the configured node limit is reached.
    pub fn alloc_node(&mut self) -> Option<NodeId> {
        let id = self.nodes.alloc();
        if id.is_none() {
            tracing::debug!(live = self.nodes.live(), "node arena exhausted");
        }
        id
    }

    /// Allocates an unlinked node whose data is a zero-filled buffer of
    /// `size` bytes (no data at all when `size` is zero).
    ///
    /// The buffer is owned by the caller from here on: [`free_node`](Self::free_node)
    /// returns it instead of dropping it. If the buffer cannot be allocated the
    /// node is released again and `None` is returned.
    pub fn alloc_block(&mut self, size: usize) -> Option<NodeId>
    where
        V: From<Payload>,
    {
        let id = self.alloc_node()?;
        if size == 0 {
            return Some(id);
        }
        match Payload::zeroed(size) {
            Some(payload) => {
                if let Some(node) = self.nodes.get_mut(id) {
                    node.data = Some(V::from(payload));
                }
                Some(id)
            }
            None => {
                tracing::debug!(size, "payload allocation failed");
                self.nodes.release(id);
                None
            }
        }
    }

    /// Returns an unlinked node to the arena, handing back its data.
    ///
    /// The handle (and any copy of it) is dead afterwards.
    pub fn free_node(&mut self, id: NodeId) -> Result<Option<V>> {
        if self.checked(id)?.linked {
            return Err(TreeError::StillLinked(id));
        }
        let node = self.nodes.release(id).ok_or(TreeError::StaleHandle(id))?;
        Ok(node.data)
    }

    // =========================================================================
    // Node access
    // =========================================================================

    fn checked(&self, id: NodeId) -> Result<&Node<K, V>> {
        self.nodes.get(id).ok_or(TreeError::StaleHandle(id))
    }

    pub fn key(&self, id: NodeId) -> Option<&K> {
        self.nodes.get(id)?.key.as_ref()
    }

    pub fn data(&self, id: NodeId) -> Option<&V> {
        self.nodes.get(id)?.data.as_ref()
    }

    pub fn data_mut(&mut self, id: NodeId) -> Option<&mut V> {
        self.nodes.get_mut(id)?.data.as_mut()
    }

    /// Sets the key of an unlinked node, returning the previous one.
    ///
    /// Rekeying a linked node would break the ordering, so it is refused.
    pub fn set_key(&mut self, id: NodeId, key: K) -> Result<Option<K>> {
        let node = self.nodes.get_mut(id).ok_or(TreeError::StaleHandle(id))?;
        if node.linked {
            return Err(TreeError::AlreadyLinked(id));
        }
        Ok(node.key.replace(key))
    }

    pub fn set_data(&mut self, id: NodeId, data: V) -> Result<Option<V>> {
        let node = self.nodes.get_mut(id).ok_or(TreeError::StaleHandle(id))?;
        Ok(node.data.replace(data))
    }

    pub fn take_data(&mut self, id: NodeId) -> Result<Option<V>> {
        let node = self.nodes.get_mut(id).ok_or(TreeError::StaleHandle(id))?;
        Ok(node.data.take())
    }

    pub fn is_linked(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|node| node.linked)
    }

    #[inline]
    pub(crate) fn key_at(&self, index: u32) -> &K {
        self.nodes
            .node(index)
            .key
            .as_ref()
            .expect("linked node has a key")
    }

    // =========================================================================
    // Structural queries
    // =========================================================================

    /// Cached number of linked nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of linked nodes, counted by walking the whole tree.
    pub fn size(&self) -> usize {
        let walked = self.iter().count();
        debug_assert_eq!(walked, self.count, "cached node count drifted");
        walked
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root.map(|index| self.nodes.id_of(index))
    }

    /// Smallest node, without splaying.
    pub fn head(&self) -> Option<NodeId> {
        self.root.map(|index| self.nodes.id_of(self.leftmost(index)))
    }

    /// Largest node, without splaying.
    pub fn tail(&self) -> Option<NodeId> {
        self.root.map(|index| self.nodes.id_of(self.rightmost(index)))
    }

    /// Length of the longest root-to-leaf path (0 for an empty tree).
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut stack: Vec<(u32, usize)> = self.root.map(|r| (r, 1)).into_iter().collect();
        while let Some((index, depth)) = stack.pop() {
            height = height.max(depth);
            let node = self.nodes.node(index);
            for child in [node.left, node.right].into_iter().flatten() {
                stack.push((child, depth + 1));
            }
        }
        height
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    /// Approximate heap bytes held by the node arena.
    pub fn memory_usage(&self) -> usize {
        self.nodes.memory_usage()
    }

    pub(crate) fn leftmost(&self, mut index: u32) -> u32 {
        while let Some(left) = self.nodes.node(index).left {
            index = left;
        }
        index
    }

    pub(crate) fn rightmost(&self, mut index: u32) -> u32 {
        while let Some(right) = self.nodes.node(index).right {
            index = right;
        }
        index
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    /// One-line access report, e.g. `f(12 3.50) i(8 2.75) s(15 1.40)`:
    /// lookups, inserts and splays, each with its average comparisons (or
    /// rotation steps) per operation.
    pub fn stats(&self) -> String {
        self.stats.to_string()
    }

    pub fn stats_snapshot(&self) -> SplayStats {
        self.stats
    }

    // =========================================================================
    // Splaying
    // =========================================================================

    /// Splays `path`'s last node to the root. `path` must be the chain of links
    /// from the current root down to that node.
    pub(crate) fn splay_path(&mut self, path: &[u32]) {
        let Some(&x) = path.last() else {
            return;
        };

        let mut depth = path.len() - 1;
        let mut loops = 0u64;
        while depth >= 2 {
            let parent = path[depth - 1];
            let grandparent = path[depth - 2];
            let above = depth.checked_sub(3).map(|i| path[i]);

            let x_is_left = self.nodes.node(parent).left == Some(x);
            let parent_is_left = self.nodes.node(grandparent).left == Some(parent);
            if x_is_left == parent_is_left {
                // zig-zig
                self.rotate_up(parent, grandparent, above);
                self.rotate_up(x, parent, above);
            } else {
                // zig-zag
                self.rotate_up(x, parent, Some(grandparent));
                self.rotate_up(x, grandparent, above);
            }
            depth -= 2;
            loops += 1;
        }
        if depth == 1 {
            // zig
            self.rotate_up(x, path[0], None);
            loops += 1;
        }

        self.root = Some(x);
        self.stats.record_splay(loops);
    }

    /// Rotates `x` above its parent `p`, rewiring `p`'s parent `g` (or the root).
    fn rotate_up(&mut self, x: u32, p: u32, g: Link) {
        if self.nodes.node(p).left == Some(x) {
            let inner = self.nodes.node(x).right;
            self.nodes.node_mut(p).left = inner;
            self.nodes.node_mut(x).right = Some(p);
        } else {
            let inner = self.nodes.node(x).left;
            self.nodes.node_mut(p).right = inner;
            self.nodes.node_mut(x).left = Some(p);
        }

        match g {
            None => self.root = Some(x),
            Some(g) => {
                let g = self.nodes.node_mut(g);
                if g.left == Some(p) {
                    g.left = Some(x);
                } else {
                    g.right = Some(x);
                }
            }
        }
    }

    /// Unlinks the current root, joining its subtrees under the largest node
    /// of the left one.
    pub(crate) fn unlink_root(&mut self) -> Option<u32> {
        let root = self.root?;
        let node = self.nodes.node_mut(root);
        let left = node.left.take();
        let right = node.right.take();
        node.linked = false;

        self.root = match left {
            None => right,
            Some(left) => {
                let mut path = vec![left];
                let mut cur = left;
                while let Some(next) = self.nodes.node(cur).right {
                    path.push(next);
                    cur = next;
                }
                self.root = Some(left);
                self.splay_path(&path);
                self.nodes.node_mut(cur).right = right;
                Some(cur)
            }
        };
        self.count -= 1;
        Some(root)
    }
}

impl<K, V, C> SplayTree<K, V, C>
where
    C: Comparator<K>,
{
    /// Links from the root down to `index`, found by searching for its key.
    fn path_to(&self, id: NodeId) -> Result<Vec<u32>> {
        let node = self.checked(id)?;
        if !node.linked {
            return Err(TreeError::NotLinked(id));
        }
        let key = node.key.as_ref().ok_or(TreeError::MissingKey(id))?;

        let target = id.index();
        let mut path = Vec::new();
        let mut cur = self.root;
        while let Some(index) = cur {
            path.push(index);
            if index == target {
                return Ok(path);
            }
            let here = self.nodes.node(index);
            cur = match self.cmp.compare(key, self.key_at(index)) {
                Ordering::Less => here.left,
                Ordering::Greater => here.right,
                Ordering::Equal => break,
            };
        }
        Err(TreeError::NotLinked(id))
    }

    /// Moves a linked node to the root.
    pub fn splay(&mut self, id: NodeId) -> Result<()> {
        let path = self.path_to(id)?;
        self.splay_path(&path);
        Ok(())
    }

    /// Links a keyed, unlinked node into the tree.
    ///
    /// Fails with [`TreeError::DuplicateKey`] when an equal key is already
    /// linked; the node is left allocated and unlinked in that case.
    pub fn insert(&mut self, id: NodeId) -> Result<NodeId> {
        let node = self.checked(id)?;
        if node.linked {
            return Err(TreeError::AlreadyLinked(id));
        }
        let key = node.key.as_ref().ok_or(TreeError::MissingKey(id))?;

        let mut path = Vec::new();
        let mut side = Ordering::Equal;
        let mut duplicate = None;
        let mut cur = self.root;
        while let Some(index) = cur {
            path.push(index);
            side = self.cmp.compare(key, self.key_at(index));
            let here = self.nodes.node(index);
            cur = match side {
                Ordering::Less => here.left,
                Ordering::Greater => here.right,
                Ordering::Equal => {
                    duplicate = Some(index);
                    break;
                }
            };
        }
        self.stats.record_insert(path.len() as u64);
        if let Some(index) = duplicate {
            return Err(TreeError::DuplicateKey {
                existing: self.nodes.id_of(index),
            });
        }

        let index = id.index();
        let node = self.nodes.node_mut(index);
        node.left = None;
        node.right = None;
        node.linked = true;
        match path.last() {
            None => self.root = Some(index),
            Some(&parent) => {
                let parent = self.nodes.node_mut(parent);
                if side == Ordering::Less {
                    parent.left = Some(index);
                } else {
                    parent.right = Some(index);
                }
            }
        }
        self.count += 1;
        self.inserted += 1;

        let interval = self.config.splay_interval;
        if interval != 0 && self.inserted % interval == 0 {
            tracing::trace!(depth = path.len(), "forced splay of inserted node");
            path.push(index);
            self.splay_path(&path);
        }
        Ok(id)
    }

    /// [`insert`](Self::insert) for callers that treat any insertion failure,
    /// duplicates included, as corruption: logs the error and aborts.
    pub fn insert_or_abort(&mut self, id: NodeId) -> NodeId {
        match self.insert(id) {
            Ok(id) => id,
            Err(err) => {
                tracing::error!(%err, "fatal symbol table insertion");
                std::process::abort()
            }
        }
    }

    /// Allocates a node for `key`/`data` and links it.
    ///
    /// On failure the node is released again, dropping `key` and `data`.
    pub fn insert_entry(&mut self, key: K, data: V) -> Result<NodeId> {
        let id = self.alloc_node().ok_or(TreeError::AllocationFailed)?;
        if let Some(node) = self.nodes.get_mut(id) {
            node.key = Some(key);
            node.data = Some(data);
        }
        self.insert(id).map_err(|err| {
            self.nodes.release(id);
            err
        })
    }

    /// Finds `key`. Whatever node the search ends on, hit or miss, becomes the
    /// root.
    pub fn lookup<Q>(&mut self, key: &Q) -> Option<NodeId>
    where
        Q: ?Sized,
        K: Borrow<Q>,
        C: Comparator<Q>,
    {
        let mut path = Vec::new();
        let mut found = false;
        let mut cur = self.root;
        while let Some(index) = cur {
            path.push(index);
            let here = self.nodes.node(index);
            let stored: &Q = self.key_at(index).borrow();
            cur = match <C as Comparator<Q>>::compare(&self.cmp, key, stored) {
                Ordering::Less => here.left,
                Ordering::Greater => here.right,
                Ordering::Equal => {
                    found = true;
                    break;
                }
            };
        }
        self.stats.record_lookup(path.len() as u64);
        self.splay_path(&path);

        if found {
            self.root()
        } else {
            None
        }
    }

    pub fn contains_key<Q>(&mut self, key: &Q) -> bool
    where
        Q: ?Sized,
        K: Borrow<Q>,
        C: Comparator<Q>,
    {
        self.lookup(key).is_some()
    }

    /// Unlinks a node. It stays allocated (key and data intact) until
    /// [`free_node`](Self::free_node).
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        self.splay(id)?;
        self.unlink_root();
        Ok(())
    }

    /// Looks up and unlinks `key`, returning the unlinked node.
    pub fn remove_key<Q>(&mut self, key: &Q) -> Option<NodeId>
    where
        Q: ?Sized,
        K: Borrow<Q>,
        C: Comparator<Q>,
    {
        let id = self.lookup(key)?;
        self.unlink_root();
        Some(id)
    }

    /// In-order successor of `id`, which is splayed to the root first.
    pub fn next(&mut self, id: NodeId) -> Result<Option<NodeId>> {
        self.splay(id)?;
        let right = self.nodes.node(id.index()).right;
        Ok(right.map(|index| self.nodes.id_of(self.leftmost(index))))
    }

    /// In-order predecessor of `id`, which is splayed to the root first.
    pub fn prev(&mut self, id: NodeId) -> Result<Option<NodeId>> {
        self.splay(id)?;
        let left = self.nodes.node(id.index()).left;
        Ok(left.map(|index| self.nodes.id_of(self.rightmost(index))))
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for SplayTree<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(_, key, data)| (key, data)))
            .finish()
    }
}

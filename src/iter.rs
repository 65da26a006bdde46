use crate::arena::{Link, NodeId};
use crate::tree::SplayTree;

/// In-order iterator over linked nodes, driven by an explicit stack so depth
/// is never limited by the native call stack.
pub struct Iter<'a, K, V, C> {
    tree: &'a SplayTree<K, V, C>,
    stack: Vec<u32>,
}

impl<'a, K, V, C> Iter<'a, K, V, C> {
    fn push_left(&mut self, mut cur: Link) {
        while let Some(index) = cur {
            self.stack.push(index);
            cur = self.tree.nodes.node(index).left;
        }
    }
}

impl<'a, K, V, C> Iterator for Iter<'a, K, V, C> {
    type Item = (NodeId, &'a K, Option<&'a V>);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.stack.pop()?;
        let tree = self.tree;
        let node = tree.nodes.node(index);
        self.push_left(node.right);
        Some((tree.nodes.id_of(index), tree.key_at(index), node.data.as_ref()))
    }
}

impl<'a, K, V, C> IntoIterator for &'a SplayTree<K, V, C> {
    type Item = (NodeId, &'a K, Option<&'a V>);
    type IntoIter = Iter<'a, K, V, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, C> SplayTree<K, V, C> {
    pub fn iter(&self) -> Iter<'_, K, V, C> {
        let mut iter = Iter {
            tree: self,
            stack: Vec::new(),
        };
        iter.push_left(self.root);
        iter
    }

    /// Calls `visit` on every linked node in key order.
    pub fn walk(&self, mut visit: impl FnMut(NodeId, &K, Option<&V>)) {
        for (id, key, data) in self.iter() {
            visit(id, key, data);
        }
    }

    /// Snapshot of the in-order node sequence, terminated by a `None` entry.
    ///
    /// Unlike [`iter`](Self::iter) the snapshot does not borrow the tree, so
    /// the listed nodes can be removed while going through it.
    pub fn flatten(&self) -> Vec<Option<NodeId>> {
        let mut out = Vec::with_capacity(self.size() + 1);
        out.extend(self.iter().map(|(id, _, _)| Some(id)));
        out.push(None);
        out
    }

    /// Drains and frees the tree, dropping every key and data value.
    pub fn zap(self) -> usize {
        self.zap_with(|_, _| {})
    }

    /// Drains the tree root first, handing each key and its data to `deleter`,
    /// then frees the tree. Returns the number of nodes drained.
    pub fn zap_with(mut self, mut deleter: impl FnMut(K, Option<V>)) -> usize {
        let mut drained = 0;
        while let Some(index) = self.unlink_root() {
            let id = self.nodes.id_of(index);
            if let Some(node) = self.nodes.release(id) {
                if let Some(key) = node.key {
                    deleter(key, node.data);
                }
                drained += 1;
            }
        }
        tracing::debug!(drained, "zapped splay tree");
        self.free();
        drained
    }
}

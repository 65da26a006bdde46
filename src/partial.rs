//! Unique-abbreviation lookup.
//!
//! Resolves a possibly abbreviated name (`"gl"`) against the full keys of a
//! byte-ordered tree (`"goto-line"`, `"goto-mark"`, ...), reporting whether the
//! abbreviation is ambiguous.

use std::cmp::Ordering;

use crate::arena::NodeId;
use crate::compare::{byte_order, ByteOrder};
use crate::tree::SplayTree;

/// Outcome of [`SplayTree::partial_lookup`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PartialMatch {
    /// Smallest key starting with the prefix: the exact match when there is one.
    pub node: Option<NodeId>,
    /// Some other key also starts with the prefix.
    pub ambiguous: bool,
    /// One of those other keys.
    pub first_ambiguous: Option<NodeId>,
}

impl PartialMatch {
    /// The match, unless it is ambiguous.
    pub fn unique(&self) -> Option<NodeId> {
        if self.ambiguous {
            None
        } else {
            self.node
        }
    }
}

impl<K: AsRef<[u8]>, V> SplayTree<K, V, ByteOrder> {
    /// Finds the key that `prefix` abbreviates.
    ///
    /// An exact match wins over longer keys but is still reported as
    /// ambiguous when one of them exists (`"run"` vs `"runner"`). The matched
    /// node, or the last node visited when nothing matches, becomes the root.
    pub fn partial_lookup(&mut self, prefix: impl AsRef<[u8]>) -> PartialMatch {
        let prefix = prefix.as_ref();

        let mut path = Vec::new();
        // Depth (path length) of the smallest key >= prefix seen so far.
        let mut lower = None;
        // First visited key that extends the prefix.
        let mut collision = None;
        let mut cur = self.root;
        while let Some(index) = cur {
            path.push(index);
            let stored = self.key_at(index).as_ref();
            let here = self.nodes.node(index);
            cur = match byte_order(prefix, stored) {
                Ordering::Less => {
                    if collision.is_none() && stored.starts_with(prefix) {
                        collision = Some(index);
                    }
                    lower = Some(path.len());
                    here.left
                }
                Ordering::Greater => here.right,
                Ordering::Equal => {
                    lower = Some(path.len());
                    break;
                }
            };
        }
        self.stats.record_lookup(path.len() as u64);

        // Keys extending the prefix sort contiguously right after it, so if the
        // lower bound does not extend it nothing does.
        let matched =
            lower.filter(|&depth| self.key_at(path[depth - 1]).as_ref().starts_with(prefix));
        let Some(depth) = matched else {
            self.splay_path(&path);
            return PartialMatch::default();
        };

        path.truncate(depth);
        let node = path[depth - 1];
        self.splay_path(&path);

        // With the match at the root its in-order neighbour is the leftmost
        // node of the right subtree; the descent alone can miss it.
        let neighbour = self.nodes.node(node).right.map(|right| self.leftmost(right));
        let other = collision.filter(|&c| c != node).or_else(|| {
            neighbour.filter(|&n| self.key_at(n).as_ref().starts_with(prefix))
        });

        PartialMatch {
            node: Some(self.nodes.id_of(node)),
            ambiguous: other.is_some(),
            first_ambiguous: other.map(|index| self.nodes.id_of(index)),
        }
    }
}

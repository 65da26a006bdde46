//! # splay-symtab
//!
//! A splay-tree symbol table: a self-adjusting binary search tree used as an
//! ordered associative container for names such as commands, keywords and
//! variables.
//!
//! - Every lookup splays the node it reaches to the root, so recently used
//!   names are cheap to find again.
//! - Every 8th insertion splays the new node too, which keeps sorted insertion
//!   order from building a linked list.
//! - [`SplayTree::partial_lookup`] resolves unique abbreviations.
//! - Nodes live in an arena and are addressed by generation-checked
//!   [`NodeId`] handles, so a handle to a freed node is rejected rather than
//!   followed.
//!
//! ## Example
//!
//! ```rust
//! use splay_symtab::SplayTree;
//!
//! let mut commands: SplayTree<&str, fn() -> u32> = SplayTree::new();
//! commands.insert_entry("goto-line", || 1).unwrap();
//! commands.insert_entry("goto-mark", || 2).unwrap();
//! commands.insert_entry("search-fwd", || 3).unwrap();
//!
//! let hit = commands.partial_lookup("se");
//! assert!(!hit.ambiguous);
//! let run = commands.data(hit.node.unwrap()).unwrap();
//! assert_eq!(run(), 3);
//!
//! assert!(commands.partial_lookup("goto").ambiguous);
//! ```

#![forbid(unsafe_code)]

mod arena;
mod compare;
mod config;
mod error;
mod iter;
mod partial;
mod stats;
mod tree;

pub use arena::{NodeId, Payload};
pub use compare::{ByteOrder, Comparator};
pub use config::TreeConfig;
pub use error::{Result, TreeError};
pub use iter::Iter;
pub use partial::PartialMatch;
pub use stats::SplayStats;
pub use tree::SplayTree;


#[cfg(test)]
mod proptests;

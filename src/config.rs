/// Tuning knobs for a [`SplayTree`](crate::SplayTree).
#[derive(Debug, Clone)]
pub struct TreeConfig {
    /// Every n-th successful insertion splays the new node to the root.
    /// Sorted insertion order would otherwise build a linked list, since
    /// nothing else ever touches fresh leaves. `0` disables it.
    pub splay_interval: usize,
    /// Maximum number of nodes allocated at once (`None` = unbounded).
    pub node_limit: Option<usize>,
    /// Initial capacity hint for the node arena
    pub initial_capacity: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            splay_interval: 8,
            node_limit: None,
            initial_capacity: 0,
        }
    }
}

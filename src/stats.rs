//! Per-tree access counters.
//!
//! Counting is compiled in with the `stats` feature; without it every
//! `record_*` call is a no-op and the report is a fixed string.

use std::fmt;

pub(crate) const STATS_DISABLED: &str = "splay statistics disabled";

/// Raw counters for one tree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SplayStats {
    pub lookups: u64,
    /// Key comparisons made by lookups
    pub lookup_compares: u64,
    pub inserts: u64,
    /// Key comparisons made by insertions
    pub insert_compares: u64,
    pub splays: u64,
    /// Rotation steps (one per zig, zig-zig or zig-zag) across all splays
    pub splay_loops: u64,
}

impl SplayStats {
    #[inline]
    pub(crate) fn record_lookup(&mut self, compares: u64) {
        if cfg!(feature = "stats") {
            self.lookups += 1;
            self.lookup_compares += compares;
        }
    }

    #[inline]
    pub(crate) fn record_insert(&mut self, compares: u64) {
        if cfg!(feature = "stats") {
            self.inserts += 1;
            self.insert_compares += compares;
        }
    }

    #[inline]
    pub(crate) fn record_splay(&mut self, loops: u64) {
        if cfg!(feature = "stats") {
            self.splays += 1;
            self.splay_loops += loops;
        }
    }

    pub fn enabled() -> bool {
        cfg!(feature = "stats")
    }
}

/// `total / count` with two decimals, computed in integer hundredths.
/// Widened to `u128` so large totals cannot overflow.
struct Average {
    total: u64,
    count: u64,
}

impl fmt::Display for Average {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hundredths = if self.count == 0 {
            0
        } else {
            u128::from(self.total) * 100 / u128::from(self.count)
        };
        write!(f, "{}.{:02}", hundredths / 100, hundredths % 100)
    }
}

impl fmt::Display for SplayStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !Self::enabled() {
            return f.write_str(STATS_DISABLED);
        }
        write!(
            f,
            "f({} {}) i({} {}) s({} {})",
            self.lookups,
            Average {
                total: self.lookup_compares,
                count: self.lookups,
            },
            self.inserts,
            Average {
                total: self.insert_compares,
                count: self.inserts,
            },
            self.splays,
            Average {
                total: self.splay_loops,
                count: self.splays,
            },
        )
    }
}

//! Partition size watchdog
//!
//! Answers one question — "is this partition over the configured ceiling" —
//! from current backend state. Never mutates anything. The per-target
//! milestone map only dedups log lines; it carries no routing state.

use dashmap::DashMap;

use tessera_core::Result;
use tessera_storage::IndexOps;
use tracing::{info, warn};

const BYTES_PER_GB: f64 = 1e9;

#[derive(Debug, Default, Clone, Copy)]
struct SizeWatch {
    last_logged_gb: u64,
    warned_over_limit: bool,
}

/// Checks partition sizes against the configured ceiling.
pub struct SizeManager {
    ops: IndexOps,
    max_size_gb: f64,
    watches: DashMap<String, SizeWatch>,
}

impl SizeManager {
    /// Create a manager with the given ceiling in gigabytes.
    pub fn new(ops: IndexOps, max_size_gb: f64) -> Self {
        SizeManager {
            ops,
            max_size_gb,
            watches: DashMap::new(),
        }
    }

    /// The configured ceiling in gigabytes.
    pub fn max_size_gb(&self) -> f64 {
        self.max_size_gb
    }

    /// Whether the index behind `target` exceeds the ceiling.
    ///
    /// Logs a milestone once per newly crossed whole-gigabyte boundary and
    /// a warning the first time the ceiling is exceeded.
    ///
    /// # Errors
    /// Returns an error if the backend stats call fails.
    pub fn is_oversized(&self, target: &str) -> Result<bool> {
        let bytes = self.ops.index_size_bytes(target)?;
        let gb = bytes as f64 / BYTES_PER_GB;
        let oversized = gb > self.max_size_gb;

        let mut watch = self.watches.entry(target.to_string()).or_default();
        let whole_gb = gb as u64;
        if whole_gb > watch.last_logged_gb {
            info!(
                target: "tessera::size",
                partition = %target,
                size_gb = whole_gb,
                limit_gb = self.max_size_gb,
                "Partition crossed a gigabyte boundary"
            );
            watch.last_logged_gb = whole_gb;
        }
        if oversized && !watch.warned_over_limit {
            warn!(
                target: "tessera::size",
                partition = %target,
                size_gb = gb,
                limit_gb = self.max_size_gb,
                "Partition exceeds the configured size limit"
            );
            watch.warned_over_limit = true;
        }
        Ok(oversized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tessera_storage::MemoryStore;

    fn manager(limit_gb: f64) -> (Arc<MemoryStore>, SizeManager) {
        let store = Arc::new(MemoryStore::new());
        let ops = IndexOps::new(store.clone());
        ops.create_index("items_col_abc", &["items_col".to_string()])
            .unwrap();
        (store, SizeManager::new(ops, limit_gb))
    }

    #[test]
    fn test_undersized() {
        let (store, manager) = manager(25.0);
        store.set_index_size("items_col", Some(10_000_000_000));
        assert!(!manager.is_oversized("items_col").unwrap());
    }

    #[test]
    fn test_oversized() {
        let (store, manager) = manager(25.0);
        store.set_index_size("items_col", Some(26_000_000_000));
        assert!(manager.is_oversized("items_col").unwrap());
    }

    #[test]
    fn test_exactly_at_limit_is_not_oversized() {
        let (store, manager) = manager(25.0);
        store.set_index_size("items_col", Some(25_000_000_000));
        assert!(!manager.is_oversized("items_col").unwrap());
    }

    #[test]
    fn test_missing_target_propagates() {
        let (_, manager) = manager(25.0);
        assert!(manager.is_oversized("items_ghost").is_err());
    }
}

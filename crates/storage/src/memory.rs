//! In-memory document store
//!
//! Reference implementation of `DocumentStore`, used by every test suite and
//! usable as a backend for single-process deployments. One `RwLock` guards
//! the whole index table so an alias-update batch is observably atomic, the
//! same guarantee the real backend gives.
//!
//! An alias may be attached to several indices at once: the collection alias
//! deliberately spans every partition of its collection. Boundary aliases
//! stay unique to one index only because the routing engine never attaches
//! one twice; nothing in the store enforces it, which is exactly the
//! last-write-wins surface the cross-process race lives on.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tessera_core::{AliasAction, DocumentStore, Error, Result};

#[derive(Debug, Default)]
struct IndexState {
    aliases: Vec<String>,
    docs: Vec<(String, serde_json::Value)>,
    size_bytes: u64,
    size_override: Option<u64>,
}

impl IndexState {
    fn effective_size(&self) -> u64 {
        self.size_override.unwrap_or(self.size_bytes)
    }
}

/// In-memory `DocumentStore`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    indices: RwLock<BTreeMap<String, IndexState>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document in the index behind `target` (alias or index name).
    ///
    /// Re-putting an existing doc id replaces the document. The index's
    /// tracked size grows by the serialized document length.
    ///
    /// # Errors
    /// `Error::UnresolvedAlias` if `target` names nothing.
    pub fn put_document(
        &self,
        target: &str,
        doc_id: &str,
        document: serde_json::Value,
    ) -> Result<()> {
        let mut indices = self.indices.write();
        let index = Self::resolve_locked(&indices, target)
            .ok_or_else(|| Error::UnresolvedAlias(target.to_string()))?;
        let state = indices.get_mut(&index).expect("resolved index exists");
        let encoded_len = document.to_string().len() as u64;
        if let Some(slot) = state.docs.iter_mut().find(|(id, _)| id == doc_id) {
            slot.1 = document;
        } else {
            state.docs.push((doc_id.to_string(), document));
            state.size_bytes += encoded_len;
        }
        Ok(())
    }

    /// Number of documents stored in the index behind `target`.
    pub fn document_count(&self, target: &str) -> usize {
        let indices = self.indices.read();
        Self::resolve_locked(&indices, target)
            .and_then(|index| indices.get(&index).map(|s| s.docs.len()))
            .unwrap_or(0)
    }

    /// Override the reported size of an index (test hook for oversize
    /// scenarios). `None` reverts to the tracked size.
    pub fn set_index_size(&self, target: &str, bytes: Option<u64>) {
        let mut indices = self.indices.write();
        if let Some(index) = Self::resolve_locked(&indices, target) {
            if let Some(state) = indices.get_mut(&index) {
                state.size_override = bytes;
            }
        }
    }

    /// All physical index names, sorted.
    pub fn index_names(&self) -> Vec<String> {
        self.indices.read().keys().cloned().collect()
    }

    /// The alias set of one physical index, sorted.
    pub fn aliases_of(&self, index: &str) -> Vec<String> {
        let indices = self.indices.read();
        let mut aliases = indices
            .get(index)
            .map(|s| s.aliases.clone())
            .unwrap_or_default();
        aliases.sort();
        aliases
    }

    /// Resolve `target` to a physical index name: direct match first, then
    /// alias lookup (first index in name order if the alias spans several).
    /// Requires the lock to already be held.
    fn resolve_locked(indices: &BTreeMap<String, IndexState>, target: &str) -> Option<String> {
        if indices.contains_key(target) {
            return Some(target.to_string());
        }
        indices
            .iter()
            .find(|(_, state)| state.aliases.iter().any(|a| a == target))
            .map(|(name, _)| name.clone())
    }
}

impl DocumentStore for MemoryStore {
    fn create_index(
        &self,
        index: &str,
        aliases: &[String],
        _mapping: &serde_json::Value,
        _settings: &serde_json::Value,
    ) -> Result<()> {
        let mut indices = self.indices.write();
        if indices.contains_key(index) {
            return Err(Error::IndexAlreadyExists(index.to_string()));
        }
        indices.insert(
            index.to_string(),
            IndexState {
                aliases: aliases.to_vec(),
                ..Default::default()
            },
        );
        Ok(())
    }

    fn update_aliases(&self, actions: &[AliasAction]) -> Result<()> {
        let mut indices = self.indices.write();
        // Validate the whole batch before touching anything, so a rejected
        // batch leaves no partial application behind.
        for action in actions {
            let index = match action {
                AliasAction::Add { index, .. } | AliasAction::Remove { index, .. } => index,
            };
            if !indices.contains_key(index) {
                return Err(Error::Backend(format!("no such index: {index}")));
            }
        }
        for action in actions {
            match action {
                AliasAction::Remove { index, alias } => {
                    if let Some(state) = indices.get_mut(index) {
                        state.aliases.retain(|a| a != alias);
                    }
                }
                AliasAction::Add { index, alias } => {
                    if let Some(state) = indices.get_mut(index) {
                        if !state.aliases.iter().any(|a| a == alias) {
                            state.aliases.push(alias.clone());
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn aliases_by_prefix(&self, prefix: &str) -> Result<BTreeMap<String, Vec<String>>> {
        let indices = self.indices.read();
        let mut out = BTreeMap::new();
        for (name, state) in indices.iter() {
            if state.aliases.iter().any(|a| a.starts_with(prefix)) {
                let mut aliases = state.aliases.clone();
                aliases.sort();
                out.insert(name.clone(), aliases);
            }
        }
        Ok(out)
    }

    fn resolve_alias(&self, alias: &str) -> Result<Option<String>> {
        let indices = self.indices.read();
        Ok(indices
            .iter()
            .find(|(_, state)| state.aliases.iter().any(|a| a == alias))
            .map(|(name, _)| name.clone()))
    }

    fn index_size_bytes(&self, target: &str) -> Result<u64> {
        let indices = self.indices.read();
        let index = Self::resolve_locked(&indices, target)
            .ok_or_else(|| Error::Backend(format!("no such index: {target}")))?;
        Ok(indices[&index].effective_size())
    }

    fn latest_document_datetime(
        &self,
        target: &str,
        field: &str,
    ) -> Result<Option<DateTime<Utc>>> {
        let indices = self.indices.read();
        let index = Self::resolve_locked(&indices, target)
            .ok_or_else(|| Error::Backend(format!("no such index: {target}")))?;
        let latest = indices[&index]
            .docs
            .iter()
            .filter_map(|(_, doc)| doc.get(field).and_then(|v| v.as_str()))
            .filter_map(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .max();
        Ok(latest)
    }
}

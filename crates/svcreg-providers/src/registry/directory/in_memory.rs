//! In-process directory tree

use async_trait::async_trait;
use std::collections::BTreeMap;
use svcreg_domain::error::{Error, Result};
use svcreg_domain::ports::{DirectoryConnection, DirectoryEntry, DirectoryFilter};
use tokio::sync::RwLock;

/// `DirectoryConnection` backed by a map of DN to entry
///
/// DNs are compared case-insensitively.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    entries: RwLock<BTreeMap<String, DirectoryEntry>>,
}

impl InMemoryDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    fn key(dn: &str) -> String {
        dn.trim().to_ascii_lowercase()
    }

    fn is_at_or_below(dn: &str, base_dn: &str) -> bool {
        let dn = Self::key(dn);
        let base = Self::key(base_dn);
        dn == base || dn.ends_with(&format!(",{base}"))
    }
}

#[async_trait]
impl DirectoryConnection for InMemoryDirectory {
    async fn search(&self, base_dn: &str, filter: &DirectoryFilter) -> Result<Vec<DirectoryEntry>> {
        let entries = self.entries.read().await;
        Ok(entries
            .values()
            .filter(|entry| Self::is_at_or_below(&entry.dn, base_dn) && filter.matches(entry))
            .cloned()
            .collect())
    }

    async fn lookup(&self, dn: &str) -> Result<Option<DirectoryEntry>> {
        Ok(self.entries.read().await.get(&Self::key(dn)).cloned())
    }

    async fn add(&self, entry: DirectoryEntry) -> Result<()> {
        let mut entries = self.entries.write().await;
        let key = Self::key(&entry.dn);
        if entries.contains_key(&key) {
            return Err(Error::backend(format!("entry already exists: {}", entry.dn)));
        }
        entries.insert(key, entry);
        Ok(())
    }

    async fn modify(&self, entry: DirectoryEntry) -> Result<()> {
        let mut entries = self.entries.write().await;
        match entries.get_mut(&Self::key(&entry.dn)) {
            Some(existing) => {
                *existing = entry;
                Ok(())
            }
            None => Err(Error::not_found(format!("directory entry {}", entry.dn))),
        }
    }

    async fn delete(&self, dn: &str) -> Result<bool> {
        Ok(self.entries.write().await.remove(&Self::key(dn)).is_some())
    }
}

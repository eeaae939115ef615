// JSON-based blacklist store, same single-file layout as the original bot:
// { guild_id: { user_id: [entry] } }.

use crate::core::blacklist::{BlacklistEntry, BlacklistStore};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tokio::sync::RwLock;

type BlacklistData = HashMap<u64, HashMap<u64, Vec<BlacklistEntry>>>;

pub struct JsonBlacklistStore {
    path: PathBuf,
    cache: RwLock<BlacklistData>,
}

impl JsonBlacklistStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cache: BlacklistData = if path.exists() {
            File::open(&path)
                .ok()
                .and_then(|f| serde_json::from_reader(BufReader::new(f)).ok())
                .unwrap_or_default()
        } else {
            BlacklistData::default()
        };

        Self {
            path,
            cache: RwLock::new(cache),
        }
    }

    async fn persist(&self) -> Result<()> {
        let cache = self.cache.read().await;
        let file = File::create(&self.path)
            .with_context(|| format!("creating blacklist file {}", self.path.display()))?;
        serde_json::to_writer_pretty(file, &*cache).context("serializing blacklist")?;
        Ok(())
    }
}

#[async_trait]
impl BlacklistStore for JsonBlacklistStore {
    async fn append(&self, guild_id: u64, user_id: u64, entry: BlacklistEntry) -> Result<()> {
        {
            let mut cache = self.cache.write().await;
            cache
                .entry(guild_id)
                .or_default()
                .entry(user_id)
                .or_default()
                .push(entry);
        }
        self.persist().await
    }

    async fn entries(&self, guild_id: u64, user_id: u64) -> Result<Vec<BlacklistEntry>> {
        let cache = self.cache.read().await;
        Ok(cache
            .get(&guild_id)
            .and_then(|g| g.get(&user_id))
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn entries_survive_a_reload() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_owned();
        drop(tmp);

        let store = JsonBlacklistStore::new(path.clone());
        store
            .append(
                1,
                2,
                BlacklistEntry {
                    kind: "ban".to_string(),
                    note: "repeat offender".to_string(),
                    timestamp: Utc::now(),
                },
            )
            .await
            .unwrap();

        let store2 = JsonBlacklistStore::new(path);
        let entries = store2.entries(1, 2).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, "ban");
    }
}

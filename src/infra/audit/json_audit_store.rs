// JSON-based audit store. Append-only records in a single JSON file as a
// nested map: { guild_id: { user_id: [ViolationRecord] } }.

use crate::core::moderation::{AuditError, AuditStore, ViolationRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tokio::sync::RwLock;

type AuditData = HashMap<u64, HashMap<u64, Vec<ViolationRecord>>>;

pub struct JsonAuditStore {
    path: PathBuf,
    cache: RwLock<AuditData>,
}

impl JsonAuditStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cache: AuditData = if path.exists() {
            File::open(&path)
                .ok()
                .and_then(|f| serde_json::from_reader(BufReader::new(f)).ok())
                .unwrap_or_default()
        } else {
            AuditData::default()
        };

        Self {
            path,
            cache: RwLock::new(cache),
        }
    }

    async fn persist(&self) -> Result<(), AuditError> {
        let cache = self.cache.read().await;
        let file = File::create(&self.path).map_err(|e| AuditError::Storage(e.to_string()))?;
        serde_json::to_writer_pretty(file, &*cache)
            .map_err(|e| AuditError::Storage(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl AuditStore for JsonAuditStore {
    async fn append(&self, record: ViolationRecord) -> Result<(), AuditError> {
        {
            let mut cache = self.cache.write().await;
            cache
                .entry(record.guild_id)
                .or_default()
                .entry(record.user_id)
                .or_default()
                .push(record);
        }
        self.persist().await
    }

    async fn entries_for_user(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> Result<Vec<ViolationRecord>, AuditError> {
        let cache = self.cache.read().await;
        Ok(cache
            .get(&guild_id)
            .and_then(|g| g.get(&user_id))
            .cloned()
            .unwrap_or_default())
    }
}

// Manual blacklist - admin-maintained record of problem users.
//
// Entries are appended by explicit admin commands (including the escalation
// commands, which note the punitive action taken) and looked up on demand or
// when a listed user joins a guild.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One blacklist entry for a user in a guild. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlacklistEntry {
    /// Short category, e.g. "ban", "kick", "timeout" or a manual label.
    pub kind: String,
    /// Free-form note from the moderator.
    pub note: String,
    pub timestamp: DateTime<Utc>,
}

#[async_trait]
pub trait BlacklistStore: Send + Sync {
    async fn append(&self, guild_id: u64, user_id: u64, entry: BlacklistEntry) -> Result<()>;
    async fn entries(&self, guild_id: u64, user_id: u64) -> Result<Vec<BlacklistEntry>>;
}

pub struct BlacklistService<S: BlacklistStore> {
    store: S,
}

impl<S: BlacklistStore> BlacklistService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn add(
        &self,
        guild_id: u64,
        user_id: u64,
        kind: impl Into<String>,
        note: impl Into<String>,
    ) -> Result<()> {
        let entry = BlacklistEntry {
            kind: kind.into(),
            note: note.into(),
            timestamp: Utc::now(),
        };
        self.store.append(guild_id, user_id, entry).await
    }

    /// All entries for a user, oldest first. Empty when the user is clean.
    pub async fn check(&self, guild_id: u64, user_id: u64) -> Result<Vec<BlacklistEntry>> {
        self.store.entries(guild_id, user_id).await
    }
}

// Rule store - serves and mutates per-guild moderation rules.
//
// Reads come from an in-memory cache and never fail; mutations are applied
// to the cache first and then persisted through the RulePersistence port.
// A failed persist keeps the in-memory value (the store keeps serving it and
// the next successful mutation writes everything back out).

use super::rule_models::{GuildRuleSet, RuleUpdate};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("storage error: {0}")]
    Persistence(String),
}

/// Trait for persisting per-guild rule sets.
///
/// Following the same pattern as the other storage ports: the service is
/// generic over this, so tests can inject an in-memory implementation.
#[async_trait]
pub trait RulePersistence: Send + Sync {
    /// Load every guild's rules at startup.
    async fn load_all(&self) -> Result<HashMap<u64, GuildRuleSet>, RuleError>;

    /// Write one guild's full rule record.
    async fn save_guild(&self, guild_id: u64, rules: &GuildRuleSet) -> Result<(), RuleError>;
}

pub struct RuleStore<P: RulePersistence> {
    backend: P,
    /// guild_id -> rules. DashMap shard locks make each per-guild mutation
    /// atomic with respect to concurrent `get` calls for the same guild.
    cache: DashMap<u64, GuildRuleSet>,
    /// guild_id -> write lock. Saves for one guild are serialized so a slow
    /// write cannot land after a newer one and leave stale state on disk.
    persist_locks: DashMap<u64, Arc<Mutex<()>>>,
}

impl<P: RulePersistence> RuleStore<P> {
    /// Load all persisted rules into the cache. A backend that cannot be
    /// read yields an empty store (defaults for everyone) rather than a
    /// startup failure.
    pub async fn load(backend: P) -> Self {
        let cache = DashMap::new();
        match backend.load_all().await {
            Ok(rules) => {
                for (guild_id, ruleset) in rules {
                    cache.insert(guild_id, ruleset);
                }
            }
            Err(e) => {
                tracing::warn!("Could not load persisted rules, starting empty: {}", e);
            }
        }
        Self {
            backend,
            cache,
            persist_locks: DashMap::new(),
        }
    }

    /// Get a guild's rules. Guilds that were never configured get defaults.
    pub fn get(&self, guild_id: u64) -> GuildRuleSet {
        self.cache
            .get(&guild_id)
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Whether a caller may manage this guild's rules.
    pub fn is_authorized(&self, guild_id: u64, is_admin: bool, member_roles: &[u64]) -> bool {
        if is_admin {
            return true;
        }
        let rules = self.get(guild_id);
        member_roles.iter().any(|r| rules.manager_roles.contains(r))
    }

    /// Merge a partial threshold update into a guild's rules.
    pub async fn update(&self, guild_id: u64, update: RuleUpdate) -> Result<GuildRuleSet, RuleError> {
        update.validate().map_err(RuleError::InvalidConfig)?;
        self.mutate(guild_id, |rules| update.apply_to(rules)).await
    }

    pub async fn add_word(&self, guild_id: u64, word: String) -> Result<GuildRuleSet, RuleError> {
        if word.is_empty() {
            return Err(RuleError::InvalidConfig(
                "banned word must not be empty".to_string(),
            ));
        }
        self.mutate(guild_id, |rules| {
            rules.banned_words.insert(word);
        })
        .await
    }

    /// Remove a banned word. Removing a word that is not present is a no-op.
    pub async fn remove_word(&self, guild_id: u64, word: &str) -> Result<GuildRuleSet, RuleError> {
        self.mutate(guild_id, |rules| {
            rules.banned_words.remove(word);
        })
        .await
    }

    pub async fn grant_role(&self, guild_id: u64, role_id: u64) -> Result<GuildRuleSet, RuleError> {
        self.mutate(guild_id, |rules| {
            rules.manager_roles.insert(role_id);
        })
        .await
    }

    pub async fn revoke_role(&self, guild_id: u64, role_id: u64) -> Result<GuildRuleSet, RuleError> {
        self.mutate(guild_id, |rules| {
            rules.manager_roles.remove(&role_id);
        })
        .await
    }

    pub async fn bind_log_channel(
        &self,
        guild_id: u64,
        channel_id: Option<u64>,
    ) -> Result<GuildRuleSet, RuleError> {
        self.mutate(guild_id, |rules| {
            rules.log_channel_id = channel_id;
        })
        .await
    }

    /// Apply a mutation under the guild's cache entry lock, then persist.
    /// The in-memory update is kept even when the persist fails; the error
    /// is reported so the caller can surface it.
    ///
    /// Saves for one guild run under a per-guild async lock and re-read the
    /// cache while holding it, so whichever write reaches the backend last
    /// carries every mutation applied before it. Without this, a slow save
    /// of an older snapshot could overwrite a newer one on disk.
    async fn mutate(
        &self,
        guild_id: u64,
        f: impl FnOnce(&mut GuildRuleSet),
    ) -> Result<GuildRuleSet, RuleError> {
        let snapshot = {
            let mut entry = self.cache.entry(guild_id).or_default();
            f(&mut entry);
            entry.clone()
        };

        let lock = Arc::clone(&self.persist_locks.entry(guild_id).or_default());
        let _guard = lock.lock().await;
        let latest = self
            .cache
            .get(&guild_id)
            .map(|r| r.clone())
            .unwrap_or_else(|| snapshot.clone());

        if let Err(e) = self.backend.save_guild(guild_id, &latest).await {
            tracing::warn!(
                guild_id,
                "Rule persistence failed, keeping in-memory value: {}",
                e
            );
            return Err(e);
        }
        Ok(snapshot)
    }
}

// JSON-based rule persistence. All guilds live in a single JSON file as a
// map: { guild_id: GuildRuleSet }.

use crate::core::rules::{GuildRuleSet, RuleError, RulePersistence};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tokio::sync::RwLock;

pub struct JsonRuleStore {
    path: PathBuf,
    /// Full file contents, so one guild's save rewrites everything it knows.
    cache: RwLock<HashMap<u64, GuildRuleSet>>,
}

impl JsonRuleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn read_file(&self) -> Result<HashMap<u64, GuildRuleSet>, RuleError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let file = File::open(&self.path).map_err(|e| RuleError::Persistence(e.to_string()))?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| RuleError::Persistence(e.to_string()))
    }
}

#[async_trait]
impl RulePersistence for JsonRuleStore {
    async fn load_all(&self) -> Result<HashMap<u64, GuildRuleSet>, RuleError> {
        let loaded = self.read_file()?;
        *self.cache.write().await = loaded.clone();
        Ok(loaded)
    }

    async fn save_guild(&self, guild_id: u64, rules: &GuildRuleSet) -> Result<(), RuleError> {
        let mut cache = self.cache.write().await;
        cache.insert(guild_id, rules.clone());
        let file = File::create(&self.path).map_err(|e| RuleError::Persistence(e.to_string()))?;
        serde_json::to_writer_pretty(file, &*cache)
            .map_err(|e| RuleError::Persistence(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn rules_survive_a_reload() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_owned();
        drop(tmp);

        let store = JsonRuleStore::new(path.clone());
        store.load_all().await.unwrap();

        let mut rules = GuildRuleSet::default();
        rules.banned_words.insert("spam".to_string());
        rules.window_secs = 12;
        store.save_guild(42, &rules).await.unwrap();

        let store2 = JsonRuleStore::new(path);
        let loaded = store2.load_all().await.unwrap();
        assert_eq!(loaded.get(&42), Some(&rules));
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonRuleStore::new(dir.path().join("rules.json"));
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn saving_one_guild_keeps_the_others() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_owned();
        drop(tmp);

        let store = JsonRuleStore::new(path.clone());
        store.load_all().await.unwrap();
        store.save_guild(1, &GuildRuleSet::default()).await.unwrap();

        let mut other = GuildRuleSet::default();
        other.banned_words.insert("scam".to_string());
        store.save_guild(2, &other).await.unwrap();

        let reloaded = JsonRuleStore::new(path);
        let loaded = reloaded.load_all().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded.get(&2).unwrap().banned_words.contains("scam"));
    }
}

// Rule domain models - per-guild moderation configuration.
//
// These are pure domain types with no Discord dependencies.
// The Discord layer converts command arguments into RuleUpdate values.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// The complete moderation rule set for one guild.
///
/// A guild that has never been configured gets `Default` values; the record
/// is created lazily on the first admin mutation and never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuildRuleSet {
    /// Banned words, matched as case-sensitive substrings.
    /// BTreeSet so the scan order is lexicographic and deterministic.
    pub banned_words: BTreeSet<String>,
    /// Sliding window length in seconds.
    pub window_secs: u64,
    /// Maximum messages allowed inside one window.
    pub max_messages_per_window: u32,
    /// How many consecutive identical messages are tolerated.
    pub max_duplicates: u32,
    /// Maximum mentions allowed in a single message.
    pub max_mentions_per_message: u32,
    /// Roles allowed to manage this guild's rules (besides administrators).
    pub manager_roles: HashSet<u64>,
    /// Channel that receives violation log posts, if bound.
    pub log_channel_id: Option<u64>,
}

impl Default for GuildRuleSet {
    fn default() -> Self {
        Self {
            banned_words: BTreeSet::new(),
            window_secs: 6,                // 6 second window...
            max_messages_per_window: 8,    // ...holding at most 8 messages
            max_duplicates: 3,             // 3 identical messages in a row
            max_mentions_per_message: 8,   // 8 mentions per message
            manager_roles: HashSet::new(),
            log_channel_id: None,
        }
    }
}

/// A partial update to a guild's thresholds. `None` fields are left alone,
/// so applying the same update twice is idempotent.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleUpdate {
    pub window_secs: Option<u64>,
    pub max_messages_per_window: Option<u32>,
    pub max_duplicates: Option<u32>,
    pub max_mentions_per_message: Option<u32>,
}

impl RuleUpdate {
    /// Check the update against the rule invariants (window > 0,
    /// thresholds >= 1) without touching any stored state.
    pub fn validate(&self) -> Result<(), String> {
        if self.window_secs == Some(0) {
            return Err("window duration must be greater than zero".to_string());
        }
        if self.max_messages_per_window == Some(0) {
            return Err("max messages per window must be at least 1".to_string());
        }
        if self.max_duplicates == Some(0) {
            return Err("duplicate threshold must be at least 1".to_string());
        }
        if self.max_mentions_per_message == Some(0) {
            return Err("mention limit must be at least 1".to_string());
        }
        Ok(())
    }

    /// Merge the update into an existing rule set.
    pub fn apply_to(&self, rules: &mut GuildRuleSet) {
        if let Some(v) = self.window_secs {
            rules.window_secs = v;
        }
        if let Some(v) = self.max_messages_per_window {
            rules.max_messages_per_window = v;
        }
        if let Some(v) = self.max_duplicates {
            rules.max_duplicates = v;
        }
        if let Some(v) = self.max_mentions_per_message {
            rules.max_mentions_per_message = v;
        }
    }
}

// Moderation domain models - data structures for the decision pipeline.
//
// These are pure domain types with no Discord dependencies.
// The Discord layer converts gateway events into these and back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of violation a message was classified as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationKind {
    /// Message body contains a banned word.
    BannedWord,
    /// User sent too many messages inside the window.
    RateSpam,
    /// The last N messages from the user were identical.
    DuplicateSpam,
    /// Repeated broadcast/mass mentions inside the window.
    MassMention,
    /// Not a violation.
    None,
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViolationKind::BannedWord => write!(f, "Banned Word"),
            ViolationKind::RateSpam => write!(f, "Rate Spam"),
            ViolationKind::DuplicateSpam => write!(f, "Duplicate Spam"),
            ViolationKind::MassMention => write!(f, "Mass Mention"),
            ViolationKind::None => write!(f, "None"),
        }
    }
}

/// Result of evaluating one message.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub kind: ViolationKind,
    /// Matched word or content snippet backing the classification.
    pub evidence: String,
}

impl Decision {
    pub fn allow() -> Self {
        Self {
            kind: ViolationKind::None,
            evidence: String::new(),
        }
    }

    pub fn violation(kind: ViolationKind, evidence: impl Into<String>) -> Self {
        Self {
            kind,
            evidence: evidence.into(),
        }
    }

    pub fn is_violation(&self) -> bool {
        self.kind != ViolationKind::None
    }
}

/// One inbound guild message, already stripped down to what the core needs.
#[derive(Debug, Clone)]
pub struct MessageEvent {
    pub guild_id: u64,
    pub user_id: u64,
    pub author_is_bot: bool,
    pub content: String,
    pub mention_count: u32,
    pub is_broadcast_mention: bool,
    /// Monotonic seconds (see `MonotonicClock`).
    pub timestamp: f64,
}

/// Reference to a deletable message in some channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    pub channel_id: u64,
    pub message_id: u64,
}

/// Append-only audit entry, written once per violation and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationRecord {
    pub guild_id: u64,
    pub user_id: u64,
    pub kind: ViolationKind,
    pub evidence: String,
    pub timestamp: DateTime<Utc>,
}

// Moderation decision engine - classifies one inbound message.
//
// Evaluation order (first match wins):
// 1. Banned-word substring scan, lexicographic over the guild's word set,
//    skipping globally-exempted terms. A hit is terminal and bypasses all
//    window bookkeeping.
// 2. Tracker flags, mapped in the fixed tie-break order
//    rate > mass-mention > duplicate.
//
// NO Discord dependencies here - just pure domain logic.

use super::moderation_models::{Decision, MessageEvent, ViolationKind};
use crate::core::rules::{RulePersistence, RuleStore};
use crate::core::tracker::ActivityTracker;
use std::collections::BTreeSet;
use std::sync::Arc;

/// How much of a message body to keep as audit evidence.
const EVIDENCE_SNIPPET_LEN: usize = 80;

pub struct DecisionEngine<P: RulePersistence> {
    rules: Arc<RuleStore<P>>,
    tracker: ActivityTracker,
    /// Terms that never count as banned-word hits, process-wide.
    exempt_terms: BTreeSet<String>,
}

impl<P: RulePersistence> DecisionEngine<P> {
    pub fn new(rules: Arc<RuleStore<P>>, exempt_terms: BTreeSet<String>) -> Self {
        Self {
            rules,
            tracker: ActivityTracker::new(),
            exempt_terms,
        }
    }

    /// Classify one message. Every non-banned-word message is recorded
    /// against the sender's activity window, including ones that come back
    /// as `None`.
    pub fn evaluate(&self, event: &MessageEvent) -> Decision {
        if event.author_is_bot {
            return Decision::allow();
        }

        let rules = self.rules.get(event.guild_id);

        // Banned words first: cheaper than window bookkeeping and the
        // highest-priority classification. BTreeSet iteration makes the
        // first match deterministic.
        for word in &rules.banned_words {
            if self.exempt_terms.contains(word) {
                continue;
            }
            if event.content.contains(word.as_str()) {
                return Decision::violation(ViolationKind::BannedWord, word.clone());
            }
        }

        let snapshot = self.tracker.record(
            event.guild_id,
            event.user_id,
            event.timestamp,
            &event.content,
            event.mention_count,
            event.is_broadcast_mention,
            &rules,
        );

        if snapshot.rate_exceeded {
            Decision::violation(
                ViolationKind::RateSpam,
                format!(
                    "more than {} messages within {}s",
                    rules.max_messages_per_window, rules.window_secs
                ),
            )
        } else if snapshot.mass_mention_exceeded {
            let evidence = if event.is_broadcast_mention {
                "repeated mass mentions (broadcast mention)".to_string()
            } else {
                format!("repeated mass mentions ({} in message)", event.mention_count)
            };
            Decision::violation(ViolationKind::MassMention, evidence)
        } else if snapshot.duplicate_exceeded {
            Decision::violation(ViolationKind::DuplicateSpam, snippet(&event.content))
        } else {
            Decision::allow()
        }
    }

    /// Evict idle activity windows; returns how many were dropped.
    pub fn sweep_idle(&self, now: f64, idle_secs: f64) -> usize {
        self.tracker.evict_idle(now, idle_secs)
    }

    #[cfg(test)]
    pub(crate) fn tracker(&self) -> &ActivityTracker {
        &self.tracker
    }
}

fn snippet(content: &str) -> String {
    if content.chars().count() <= EVIDENCE_SNIPPET_LEN {
        content.to_string()
    } else {
        let mut s: String = content.chars().take(EVIDENCE_SNIPPET_LEN).collect();
        s.push_str("...");
        s
    }
}

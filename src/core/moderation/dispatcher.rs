// Action dispatcher - turns a Decision into calls against the action sink
// and one append-only audit record.
//
// Sink failures are logged and swallowed: a message that was already deleted
// or a missing permission must never abort audit recording. The sink and the
// audit store are both ports so the Discord layer and the tests can supply
// their own.

use super::moderation_models::{Decision, MessageEvent, MessageRef, ViolationRecord};
use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("action rejected by transport: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit storage error: {0}")]
    Storage(String),
}

/// Outbound moderation actions (the transport side of the bot).
///
/// The automated decision path only ever deletes, warns and logs;
/// timeout/kick/ban exist for explicit admin commands.
#[async_trait]
pub trait ActionSink: Send + Sync {
    async fn delete_message(&self, message: MessageRef) -> Result<(), SinkError>;

    async fn send_warning(
        &self,
        channel_id: u64,
        user_id: u64,
        text: &str,
    ) -> Result<(), SinkError>;

    async fn post_log_entry(
        &self,
        log_channel_id: u64,
        record: &ViolationRecord,
    ) -> Result<(), SinkError>;

    async fn timeout_user(
        &self,
        guild_id: u64,
        user_id: u64,
        duration_secs: u64,
        reason: &str,
    ) -> Result<(), SinkError>;

    async fn kick_user(&self, guild_id: u64, user_id: u64, reason: &str) -> Result<(), SinkError>;

    async fn ban_user(&self, guild_id: u64, user_id: u64, reason: &str) -> Result<(), SinkError>;
}

/// Append-only store of violation records.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append(&self, record: ViolationRecord) -> Result<(), AuditError>;

    async fn entries_for_user(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> Result<Vec<ViolationRecord>, AuditError>;
}

/// What actually happened while applying a decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchResult {
    pub deleted: bool,
    pub warned: bool,
    pub recorded: bool,
    pub logged: bool,
}

pub struct ActionDispatcher<K: ActionSink, A: AuditStore> {
    sink: K,
    audit: A,
}

impl<K: ActionSink, A: AuditStore> ActionDispatcher<K, A> {
    pub fn new(sink: K, audit: A) -> Self {
        Self { sink, audit }
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn audit(&self) -> &A {
        &self.audit
    }

    /// Apply a decision: delete the message, warn the author, append the
    /// audit record and forward it to the guild's log channel if one is
    /// bound. A `None` decision does nothing.
    pub async fn apply(
        &self,
        event: &MessageEvent,
        message: MessageRef,
        decision: &Decision,
        log_channel_id: Option<u64>,
    ) -> DispatchResult {
        let mut result = DispatchResult::default();
        if !decision.is_violation() {
            return result;
        }

        match self.sink.delete_message(message).await {
            Ok(()) => result.deleted = true,
            Err(e) => {
                // Already-gone messages and missing permissions are expected;
                // the classification still gets recorded below.
                tracing::warn!(
                    guild_id = event.guild_id,
                    user_id = event.user_id,
                    "Failed to delete message: {}",
                    e
                );
            }
        }

        let warning = format!(
            "Your message was removed: {} ({})",
            decision.kind, decision.evidence
        );
        match self
            .sink
            .send_warning(message.channel_id, event.user_id, &warning)
            .await
        {
            Ok(()) => result.warned = true,
            Err(e) => tracing::warn!("Failed to send warning: {}", e),
        }

        let record = ViolationRecord {
            guild_id: event.guild_id,
            user_id: event.user_id,
            kind: decision.kind.clone(),
            evidence: decision.evidence.clone(),
            timestamp: Utc::now(),
        };

        match self.audit.append(record.clone()).await {
            Ok(()) => result.recorded = true,
            Err(e) => tracing::error!("Failed to append audit record: {}", e),
        }

        if let Some(channel_id) = log_channel_id {
            match self.sink.post_log_entry(channel_id, &record).await {
                Ok(()) => result.logged = true,
                Err(e) => tracing::warn!("Failed to post log entry: {}", e),
            }
        }

        tracing::info!(
            guild_id = event.guild_id,
            user_id = event.user_id,
            kind = %record.kind,
            deleted = result.deleted,
            "Moderation action applied"
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::moderation_models::ViolationKind;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MockSink {
        fail_delete: AtomicBool,
        deletes: Mutex<Vec<MessageRef>>,
        warnings: Mutex<Vec<(u64, u64, String)>>,
        log_posts: Mutex<Vec<(u64, ViolationRecord)>>,
        escalations: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ActionSink for MockSink {
        async fn delete_message(&self, message: MessageRef) -> Result<(), SinkError> {
            if self.fail_delete.load(Ordering::SeqCst) {
                return Err(SinkError::Rejected("missing permission".to_string()));
            }
            self.deletes.lock().await.push(message);
            Ok(())
        }

        async fn send_warning(
            &self,
            channel_id: u64,
            user_id: u64,
            text: &str,
        ) -> Result<(), SinkError> {
            self.warnings
                .lock()
                .await
                .push((channel_id, user_id, text.to_string()));
            Ok(())
        }

        async fn post_log_entry(
            &self,
            log_channel_id: u64,
            record: &ViolationRecord,
        ) -> Result<(), SinkError> {
            self.log_posts
                .lock()
                .await
                .push((log_channel_id, record.clone()));
            Ok(())
        }

        async fn timeout_user(
            &self,
            _guild_id: u64,
            user_id: u64,
            duration_secs: u64,
            _reason: &str,
        ) -> Result<(), SinkError> {
            self.escalations
                .lock()
                .await
                .push(format!("timeout:{}:{}", user_id, duration_secs));
            Ok(())
        }

        async fn kick_user(
            &self,
            _guild_id: u64,
            user_id: u64,
            _reason: &str,
        ) -> Result<(), SinkError> {
            self.escalations.lock().await.push(format!("kick:{}", user_id));
            Ok(())
        }

        async fn ban_user(
            &self,
            _guild_id: u64,
            user_id: u64,
            _reason: &str,
        ) -> Result<(), SinkError> {
            self.escalations.lock().await.push(format!("ban:{}", user_id));
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockAudit {
        records: Mutex<Vec<ViolationRecord>>,
    }

    #[async_trait]
    impl AuditStore for MockAudit {
        async fn append(&self, record: ViolationRecord) -> Result<(), AuditError> {
            self.records.lock().await.push(record);
            Ok(())
        }

        async fn entries_for_user(
            &self,
            guild_id: u64,
            user_id: u64,
        ) -> Result<Vec<ViolationRecord>, AuditError> {
            Ok(self
                .records
                .lock()
                .await
                .iter()
                .filter(|r| r.guild_id == guild_id && r.user_id == user_id)
                .cloned()
                .collect())
        }
    }

    fn event() -> MessageEvent {
        MessageEvent {
            guild_id: 1,
            user_id: 2,
            author_is_bot: false,
            content: "spammy".to_string(),
            mention_count: 0,
            is_broadcast_mention: false,
            timestamp: 0.0,
        }
    }

    const MSG: MessageRef = MessageRef {
        channel_id: 10,
        message_id: 20,
    };

    #[tokio::test]
    async fn none_decision_performs_no_action() {
        let dispatcher = ActionDispatcher::new(MockSink::default(), MockAudit::default());
        let result = dispatcher
            .apply(&event(), MSG, &Decision::allow(), Some(30))
            .await;

        assert_eq!(result, DispatchResult::default());
        assert!(dispatcher.sink().deletes.lock().await.is_empty());
        assert!(dispatcher.audit().records.lock().await.is_empty());
    }

    #[tokio::test]
    async fn violation_deletes_warns_records_and_logs() {
        let dispatcher = ActionDispatcher::new(MockSink::default(), MockAudit::default());
        let decision = Decision::violation(ViolationKind::BannedWord, "spam");
        let result = dispatcher.apply(&event(), MSG, &decision, Some(30)).await;

        assert!(result.deleted && result.warned && result.recorded && result.logged);
        assert_eq!(dispatcher.sink().deletes.lock().await.as_slice(), &[MSG]);

        let warnings = dispatcher.sink().warnings.lock().await;
        assert_eq!(warnings[0].0, MSG.channel_id);
        assert_eq!(warnings[0].1, 2);

        let records = dispatcher.audit().records.lock().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, ViolationKind::BannedWord);
        assert_eq!(records[0].evidence, "spam");

        let posts = dispatcher.sink().log_posts.lock().await;
        assert_eq!(posts[0].0, 30);
    }

    #[tokio::test]
    async fn delete_failure_still_records_the_violation() {
        let sink = MockSink::default();
        sink.fail_delete.store(true, Ordering::SeqCst);
        let dispatcher = ActionDispatcher::new(sink, MockAudit::default());

        let decision = Decision::violation(ViolationKind::RateSpam, "flood");
        let result = dispatcher.apply(&event(), MSG, &decision, None).await;

        assert!(!result.deleted);
        assert!(result.recorded);
        assert_eq!(dispatcher.audit().records.lock().await.len(), 1);
    }

    // Escalations and audit lookups go through the dispatcher's accessors,
    // the same path the admin commands take.
    #[tokio::test]
    async fn accessors_expose_sink_and_audit_trait_methods() {
        let dispatcher = ActionDispatcher::new(MockSink::default(), MockAudit::default());

        dispatcher
            .sink()
            .timeout_user(1, 2, 600, "flooding")
            .await
            .unwrap();
        dispatcher.sink().kick_user(1, 2, "flooding").await.unwrap();
        dispatcher.sink().ban_user(1, 2, "flooding").await.unwrap();

        let expected: Vec<String> = vec![
            "timeout:2:600".to_string(),
            "kick:2".to_string(),
            "ban:2".to_string(),
        ];
        assert_eq!(*dispatcher.sink().escalations.lock().await, expected);

        let decision = Decision::violation(ViolationKind::RateSpam, "flood");
        dispatcher.apply(&event(), MSG, &decision, None).await;
        let records = dispatcher.audit().entries_for_user(1, 2).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, ViolationKind::RateSpam);
    }

    #[tokio::test]
    async fn no_log_post_without_a_bound_channel() {
        let dispatcher = ActionDispatcher::new(MockSink::default(), MockAudit::default());
        let decision = Decision::violation(ViolationKind::DuplicateSpam, "hi");
        let result = dispatcher.apply(&event(), MSG, &decision, None).await;

        assert!(!result.logged);
        assert!(dispatcher.sink().log_posts.lock().await.is_empty());
    }
}

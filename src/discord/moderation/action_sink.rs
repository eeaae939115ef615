// Serenity-backed action sink - the only place where moderation actions
// touch the Discord API.

use crate::core::moderation::{ActionSink, MessageRef, SinkError, ViolationRecord};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// How long an automated warning stays visible before it is cleaned up.
const WARNING_TTL_SECS: u64 = 10;

pub struct DiscordActionSink {
    http: Arc<serenity::Http>,
}

impl DiscordActionSink {
    pub fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

fn rejected(e: serenity::Error) -> SinkError {
    SinkError::Rejected(e.to_string())
}

#[async_trait]
impl ActionSink for DiscordActionSink {
    async fn delete_message(&self, message: MessageRef) -> Result<(), SinkError> {
        self.http
            .delete_message(
                serenity::ChannelId::new(message.channel_id),
                serenity::MessageId::new(message.message_id),
                Some("moderation: rule violation"),
            )
            .await
            .map_err(rejected)
    }

    async fn send_warning(
        &self,
        channel_id: u64,
        user_id: u64,
        text: &str,
    ) -> Result<(), SinkError> {
        let channel = serenity::ChannelId::new(channel_id);
        let warning = channel
            .say(&self.http, format!("<@{}> {}", user_id, text))
            .await
            .map_err(rejected)?;

        // Transient: clean the warning up after a short delay.
        let http = Arc::clone(&self.http);
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_secs(WARNING_TTL_SECS)).await;
            if let Err(e) = http.delete_message(channel, warning.id, None).await {
                tracing::debug!("Could not clean up warning message: {}", e);
            }
        });

        Ok(())
    }

    async fn post_log_entry(
        &self,
        log_channel_id: u64,
        record: &ViolationRecord,
    ) -> Result<(), SinkError> {
        let timestamp = serenity::Timestamp::from_unix_timestamp(record.timestamp.timestamp())
            .unwrap_or_else(|_| serenity::Timestamp::now());
        let embed = serenity::CreateEmbed::new()
            .title("Moderation Action")
            .color(0xE74C3C)
            .field("User", format!("<@{}>", record.user_id), true)
            .field("Violation", record.kind.to_string(), true)
            .field("Evidence", format!("`{}`", record.evidence), false)
            .timestamp(timestamp);

        serenity::ChannelId::new(log_channel_id)
            .send_message(&self.http, serenity::CreateMessage::new().embed(embed))
            .await
            .map_err(rejected)?;
        Ok(())
    }

    async fn timeout_user(
        &self,
        guild_id: u64,
        user_id: u64,
        duration_secs: u64,
        reason: &str,
    ) -> Result<(), SinkError> {
        let until = serenity::Timestamp::from_unix_timestamp(
            chrono::Utc::now().timestamp() + duration_secs as i64,
        )
        .map_err(|e| SinkError::Rejected(e.to_string()))?;

        serenity::GuildId::new(guild_id)
            .edit_member(
                &self.http,
                serenity::UserId::new(user_id),
                serenity::EditMember::new()
                    .disable_communication_until_datetime(until)
                    .audit_log_reason(reason),
            )
            .await
            .map_err(rejected)?;
        Ok(())
    }

    async fn kick_user(&self, guild_id: u64, user_id: u64, reason: &str) -> Result<(), SinkError> {
        serenity::GuildId::new(guild_id)
            .kick_with_reason(&self.http, serenity::UserId::new(user_id), reason)
            .await
            .map_err(rejected)
    }

    async fn ban_user(&self, guild_id: u64, user_id: u64, reason: &str) -> Result<(), SinkError> {
        serenity::GuildId::new(guild_id)
            .ban_with_reason(&self.http, serenity::UserId::new(user_id), 0, reason)
            .await
            .map_err(rejected)
    }
}

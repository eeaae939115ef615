// Discord-specific moderation handling - feeds gateway events into the core
// decision pipeline and applies the outcome.
//
// This layer is THIN - no business logic, just translation.

use crate::core::moderation::{MessageEvent, MessageRef};
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

/// Run one inbound message through the decision engine and, on a violation,
/// through the dispatcher. Returns `true` if the message was acted on.
pub async fn handle_message(
    _ctx: &serenity::Context,
    msg: &serenity::Message,
    data: &Data,
) -> Result<bool, Error> {
    // Skip bots (including our own messages)
    if msg.author.bot {
        return Ok(false);
    }

    // Only guild messages carry moderation rules
    let guild_id = match msg.guild_id {
        Some(id) => id.get(),
        None => return Ok(false),
    };

    let event = MessageEvent {
        guild_id,
        user_id: msg.author.id.get(),
        author_is_bot: false,
        content: msg.content.clone(),
        mention_count: (msg.mentions.len() + msg.mention_roles.len()) as u32,
        is_broadcast_mention: msg.mention_everyone,
        timestamp: data.clock.now(),
    };

    let decision = data.engine.evaluate(&event);
    if !decision.is_violation() {
        return Ok(false);
    }

    let message_ref = MessageRef {
        channel_id: msg.channel_id.get(),
        message_id: msg.id.get(),
    };
    let log_channel = data.rules.get(guild_id).log_channel_id;

    data.dispatcher
        .apply(&event, message_ref, &decision, log_channel)
        .await;

    Ok(true)
}

/// Post a notice to the guild's log channel when a blacklisted user joins.
pub async fn handle_member_join(
    ctx: &serenity::Context,
    data: &Data,
    member: &serenity::Member,
) -> Result<(), Error> {
    let guild_id = member.guild_id.get();
    let user_id = member.user.id.get();

    let entries = data
        .blacklist
        .check(guild_id, user_id)
        .await
        .map_err(|e| Error::from(e.to_string()))?;
    if entries.is_empty() {
        return Ok(());
    }

    let log_channel = match data.rules.get(guild_id).log_channel_id {
        Some(id) => id,
        None => return Ok(()),
    };

    let history = entries
        .iter()
        .rev()
        .take(5)
        .map(|e| format!("{} | {} | {}", e.kind, e.note, e.timestamp.format("%Y-%m-%d")))
        .collect::<Vec<_>>()
        .join("\n");

    let embed = serenity::CreateEmbed::new()
        .title("Blacklisted user joined")
        .color(0xF39C12)
        .description(format!(
            "<@{}> has {} blacklist entr{}:\n{}",
            user_id,
            entries.len(),
            if entries.len() == 1 { "y" } else { "ies" },
            history
        ));

    if let Err(e) = serenity::ChannelId::new(log_channel)
        .send_message(&ctx.http, serenity::CreateMessage::new().embed(embed))
        .await
    {
        tracing::warn!("Failed to post blacklist join notice: {}", e);
    }

    Ok(())
}

// Manual escalation commands - timeout, kick and ban.
//
// Escalation is never automatic: the decision pipeline only deletes and
// warns. These commands are the sole path to punitive actions, and each one
// leaves a blacklist entry so the action shows up in `/blacklist check`.

use super::{Context, Error};
use crate::core::moderation::ActionSink;
use poise::serenity_prelude as serenity;

/// Time a user out.
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn timeout(
    ctx: Context<'_>,
    #[description = "User to time out"] user: serenity::User,
    #[description = "Duration in minutes"] minutes: u64,
    #[description = "Reason"] reason: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    ctx.data()
        .dispatcher
        .sink()
        .timeout_user(guild_id.get(), user.id.get(), minutes * 60, &reason)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    record_escalation(&ctx, guild_id.get(), user.id.get(), "timeout", &reason).await;
    ctx.say(format!(
        "{} has been timed out for {} minute(s): {}",
        user.name, minutes, reason
    ))
    .await?;
    Ok(())
}

/// Kick a user from the server.
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn kick(
    ctx: Context<'_>,
    #[description = "User to kick"] user: serenity::User,
    #[description = "Reason"] reason: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    ctx.data()
        .dispatcher
        .sink()
        .kick_user(guild_id.get(), user.id.get(), &reason)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    record_escalation(&ctx, guild_id.get(), user.id.get(), "kick", &reason).await;
    ctx.say(format!("{} has been kicked: {}", user.name, reason))
        .await?;
    Ok(())
}

/// Ban a user from the server.
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn ban(
    ctx: Context<'_>,
    #[description = "User to ban"] user: serenity::User,
    #[description = "Reason"] reason: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    ctx.data()
        .dispatcher
        .sink()
        .ban_user(guild_id.get(), user.id.get(), &reason)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    record_escalation(&ctx, guild_id.get(), user.id.get(), "ban", &reason).await;
    ctx.say(format!("{} has been banned: {}", user.name, reason))
        .await?;
    Ok(())
}

/// The escalation already happened; a blacklist write failure only costs
/// the history entry, so it is logged rather than surfaced.
async fn record_escalation(ctx: &Context<'_>, guild_id: u64, user_id: u64, kind: &str, reason: &str) {
    if let Err(e) = ctx
        .data()
        .blacklist
        .add(guild_id, user_id, kind, reason)
        .await
    {
        tracing::warn!("Failed to record {} in blacklist: {}", kind, e);
    }
}

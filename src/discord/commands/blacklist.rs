// Blacklist and audit lookup slash commands.

use super::{ensure_rule_manager, Context, Error};
use crate::core::moderation::AuditStore;
use poise::serenity_prelude as serenity;

/// Manually maintained blacklist of problem users.
#[poise::command(slash_command, subcommands("add", "check"), guild_only)]
pub async fn blacklist(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Add a user to the blacklist.
#[poise::command(slash_command, guild_only)]
pub async fn add(
    ctx: Context<'_>,
    #[description = "User to blacklist"] user: serenity::User,
    #[description = "Category (e.g. spam, scam)"] kind: String,
    #[description = "Note for other moderators"] note: String,
) -> Result<(), Error> {
    let guild_id = ensure_rule_manager(&ctx).await?;

    ctx.data()
        .blacklist
        .add(guild_id, user.id.get(), kind, note)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    ctx.say(format!("Added {} to the blacklist.", user.name))
        .await?;
    Ok(())
}

/// Show a user's blacklist history.
#[poise::command(slash_command, guild_only)]
pub async fn check(
    ctx: Context<'_>,
    #[description = "User to look up"] user: serenity::User,
) -> Result<(), Error> {
    let guild_id = ensure_rule_manager(&ctx).await?;

    let entries = ctx
        .data()
        .blacklist
        .check(guild_id, user.id.get())
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    let reply = if entries.is_empty() {
        format!("{} is not on the blacklist.", user.name)
    } else {
        let lines: Vec<String> = entries
            .iter()
            .map(|e| {
                format!(
                    "{} | {} | {}",
                    e.kind,
                    e.note,
                    e.timestamp.format("%Y-%m-%d %H:%M")
                )
            })
            .collect();
        format!("History for {}:\n{}", user.name, lines.join("\n"))
    };

    ctx.send(poise::CreateReply::default().content(reply).ephemeral(true))
        .await?;
    Ok(())
}

/// Show a user's recent automated violations.
#[poise::command(slash_command, guild_only)]
pub async fn violations(
    ctx: Context<'_>,
    #[description = "User to look up"] user: serenity::User,
) -> Result<(), Error> {
    let guild_id = ensure_rule_manager(&ctx).await?;

    let records = ctx
        .data()
        .dispatcher
        .audit()
        .entries_for_user(guild_id, user.id.get())
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    let reply = if records.is_empty() {
        format!("No recorded violations for {}.", user.name)
    } else {
        let lines: Vec<String> = records
            .iter()
            .rev()
            .take(10)
            .map(|r| {
                format!(
                    "{} | `{}` | {}",
                    r.kind,
                    r.evidence,
                    r.timestamp.format("%Y-%m-%d %H:%M")
                )
            })
            .collect();
        format!(
            "Last {} violation(s) for {}:\n{}",
            lines.len(),
            user.name,
            lines.join("\n")
        )
    };

    ctx.send(poise::CreateReply::default().content(reply).ephemeral(true))
        .await?;
    Ok(())
}

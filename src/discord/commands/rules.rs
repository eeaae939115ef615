// Rule management slash commands.
//
// **Notice the pattern:**
// 1. Extract primitive data from Discord types
// 2. Call core service
// 3. Format the response based on the result
//
// This layer is THIN - no business logic, just translation.

use super::{ensure_rule_manager, Context, Error};
use crate::core::rules::{RuleError, RuleUpdate};
use poise::serenity_prelude as serenity;

/// Turn a rule-store result into a user-facing reply. A persistence failure
/// is surfaced but the update itself is still live in memory.
fn mutation_reply(result: Result<crate::core::rules::GuildRuleSet, RuleError>, ok: &str) -> String {
    match result {
        Ok(_) => ok.to_string(),
        Err(RuleError::InvalidConfig(msg)) => format!("Rejected: {}", msg),
        Err(RuleError::Persistence(_)) => format!(
            "{} (warning: saving to disk failed, the change is active but not yet persisted)",
            ok
        ),
    }
}

/// Manage this server's banned words.
#[poise::command(slash_command, subcommands("add", "remove", "list"), guild_only)]
pub async fn ngword(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Add a banned word (matched as a case-sensitive substring).
#[poise::command(slash_command, guild_only)]
pub async fn add(
    ctx: Context<'_>,
    #[description = "Word to ban"] word: String,
) -> Result<(), Error> {
    let guild_id = ensure_rule_manager(&ctx).await?;
    let reply = mutation_reply(
        ctx.data().rules.add_word(guild_id, word.clone()).await,
        &format!("Added `{}` to the banned words.", word),
    );
    ctx.say(reply).await?;
    Ok(())
}

/// Remove a banned word.
#[poise::command(slash_command, guild_only)]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Word to unban"] word: String,
) -> Result<(), Error> {
    let guild_id = ensure_rule_manager(&ctx).await?;
    let reply = mutation_reply(
        ctx.data().rules.remove_word(guild_id, &word).await,
        &format!("Removed `{}` from the banned words.", word),
    );
    ctx.say(reply).await?;
    Ok(())
}

/// List this server's banned words.
#[poise::command(slash_command, guild_only)]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ensure_rule_manager(&ctx).await?;
    let rules = ctx.data().rules.get(guild_id);

    let reply = if rules.banned_words.is_empty() {
        "No banned words configured.".to_string()
    } else {
        let words: Vec<String> = rules
            .banned_words
            .iter()
            .map(|w| format!("`{}`", w))
            .collect();
        format!("Banned words: {}", words.join(", "))
    };
    ctx.send(poise::CreateReply::default().content(reply).ephemeral(true))
        .await?;
    Ok(())
}

/// Show or change this server's spam thresholds.
#[poise::command(slash_command, subcommands("show", "set"), guild_only)]
pub async fn spamconfig(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Show the current spam thresholds.
#[poise::command(slash_command, guild_only)]
pub async fn show(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;
    let rules = ctx.data().rules.get(guild_id.get());

    let embed = serenity::CreateEmbed::new()
        .title("Spam thresholds")
        .color(0x3498DB)
        .field(
            "Rate window",
            format!(
                "{} messages / {} seconds",
                rules.max_messages_per_window, rules.window_secs
            ),
            true,
        )
        .field(
            "Duplicates",
            format!("{} identical messages", rules.max_duplicates),
            true,
        )
        .field(
            "Mentions",
            format!("{} per message", rules.max_mentions_per_message),
            true,
        )
        .field(
            "Log channel",
            rules
                .log_channel_id
                .map(|id| format!("<#{}>", id))
                .unwrap_or_else(|| "not bound".to_string()),
            false,
        );

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Change spam thresholds. Omitted options are left unchanged.
#[poise::command(slash_command, guild_only)]
pub async fn set(
    ctx: Context<'_>,
    #[description = "Window length in seconds"] window_secs: Option<u64>,
    #[description = "Max messages inside one window"] max_messages: Option<u32>,
    #[description = "Consecutive identical messages tolerated"] max_duplicates: Option<u32>,
    #[description = "Max mentions per message"] max_mentions: Option<u32>,
) -> Result<(), Error> {
    let guild_id = ensure_rule_manager(&ctx).await?;

    let update = RuleUpdate {
        window_secs,
        max_messages_per_window: max_messages,
        max_duplicates,
        max_mentions_per_message: max_mentions,
    };
    let reply = mutation_reply(
        ctx.data().rules.update(guild_id, update).await,
        "Spam thresholds updated.",
    );
    ctx.say(reply).await?;
    Ok(())
}

/// Bind or unbind the moderation log channel.
#[poise::command(slash_command, subcommands("bind", "unbind"), guild_only)]
pub async fn logchannel(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Bind the channel that receives moderation log posts.
#[poise::command(slash_command, guild_only)]
pub async fn bind(
    ctx: Context<'_>,
    #[description = "Channel for moderation logs"] channel: serenity::GuildChannel,
) -> Result<(), Error> {
    let guild_id = ensure_rule_manager(&ctx).await?;
    let reply = mutation_reply(
        ctx.data()
            .rules
            .bind_log_channel(guild_id, Some(channel.id.get()))
            .await,
        &format!("Moderation logs will be posted to <#{}>.", channel.id),
    );
    ctx.say(reply).await?;
    Ok(())
}

/// Stop posting moderation logs.
#[poise::command(slash_command, guild_only)]
pub async fn unbind(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ensure_rule_manager(&ctx).await?;
    let reply = mutation_reply(
        ctx.data().rules.bind_log_channel(guild_id, None).await,
        "Moderation log channel unbound.",
    );
    ctx.say(reply).await?;
    Ok(())
}

/// Grant or revoke rule-management roles.
#[poise::command(slash_command, subcommands("grant", "revoke"), guild_only)]
pub async fn modrole(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Allow a role to manage this server's rules.
#[poise::command(slash_command, guild_only)]
pub async fn grant(
    ctx: Context<'_>,
    #[description = "Role to grant rule management"] role: serenity::Role,
) -> Result<(), Error> {
    let guild_id = ensure_rule_manager(&ctx).await?;
    let reply = mutation_reply(
        ctx.data().rules.grant_role(guild_id, role.id.get()).await,
        &format!("{} can now manage moderation rules.", role.name),
    );
    ctx.say(reply).await?;
    Ok(())
}

/// Revoke a role's rule management.
#[poise::command(slash_command, guild_only)]
pub async fn revoke(
    ctx: Context<'_>,
    #[description = "Role to revoke"] role: serenity::Role,
) -> Result<(), Error> {
    let guild_id = ensure_rule_manager(&ctx).await?;
    let reply = mutation_reply(
        ctx.data().rules.revoke_role(guild_id, role.id.get()).await,
        &format!("{} can no longer manage moderation rules.", role.name),
    );
    ctx.say(reply).await?;
    Ok(())
}

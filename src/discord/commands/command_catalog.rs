// Discord commands module.
// Each feature gets its own command file.

pub mod blacklist;
pub mod escalate;
pub mod rules;

use crate::core::blacklist::BlacklistService;
use crate::core::moderation::{ActionDispatcher, DecisionEngine};
use crate::core::rules::RuleStore;
use crate::core::tracker::MonotonicClock;
use crate::discord::moderation::action_sink::DiscordActionSink;
use crate::infra::audit::JsonAuditStore;
use crate::infra::blacklist::JsonBlacklistStore;
use crate::infra::rules::JsonRuleStore;
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared bot state, handed to every command and event handler.
pub struct Data {
    pub rules: Arc<RuleStore<JsonRuleStore>>,
    pub engine: Arc<DecisionEngine<JsonRuleStore>>,
    pub dispatcher: Arc<ActionDispatcher<DiscordActionSink, JsonAuditStore>>,
    pub blacklist: Arc<BlacklistService<JsonBlacklistStore>>,
    pub clock: Arc<MonotonicClock>,
}

/// Resolve the caller's guild and check they may manage its rules:
/// administrator permission or membership in the permitted-role set.
pub async fn ensure_rule_manager(ctx: &Context<'_>) -> Result<u64, Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;
    let member = ctx
        .author_member()
        .await
        .ok_or("Could not resolve your guild membership")?;

    // Interaction payloads carry the member's resolved permissions.
    let is_admin = member
        .permissions
        .map(|p| p.administrator())
        .unwrap_or(false);
    let roles: Vec<u64> = member.roles.iter().map(|r| r.get()).collect();

    if ctx
        .data()
        .rules
        .is_authorized(guild_id.get(), is_admin, &roles)
    {
        Ok(guild_id.get())
    } else {
        Err("You need administrator permission or a rule-manager role to do that.".into())
    }
}

// This is the entry point of the moderation bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (JSON stores)
// - `discord/` = Discord-specific adapters (commands, events, action sink)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands and event handlers

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::blacklist::BlacklistService;
use crate::core::moderation::{ActionDispatcher, DecisionEngine};
use crate::core::rules::RuleStore;
use crate::core::tracker::MonotonicClock;
use crate::discord::moderation::action_sink::DiscordActionSink;
use crate::discord::moderation::message_handler;
use crate::discord::{Data, Error};
use crate::infra::audit::JsonAuditStore;
use crate::infra::blacklist::JsonBlacklistStore;
use crate::infra::rules::JsonRuleStore;
use poise::serenity_prelude as serenity;
use std::collections::BTreeSet;
use std::sync::Arc;

/// How often the idle-window sweep runs.
const SWEEP_PERIOD_SECS: u64 = 300;
/// Default idle age after which a user's activity window is evicted.
const DEFAULT_IDLE_EVICT_SECS: u64 = 3600;

/// Event handler for non-command Discord events.
/// This is where inbound messages enter the moderation pipeline.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Message { new_message } => {
            if let Err(e) = message_handler::handle_message(ctx, new_message, data).await {
                tracing::error!("Error handling message: {}", e);
            }
        }
        serenity::FullEvent::GuildMemberAddition { new_member } => {
            if let Err(e) = message_handler::handle_member_join(ctx, data, new_member).await {
                tracing::error!("Error handling member join: {}", e);
            }
        }
        _ => {}
    }
    Ok(())
}

/// Comma-separated terms that never count as banned-word hits, e.g. common
/// substrings a guild word list would otherwise trip over.
fn exempt_terms_from_env() -> BTreeSet<String> {
    std::env::var("MODGUARD_EXEMPT_WORDS")
        .map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Get Discord bot token from environment
    let token = std::env::var("DISCORD_TOKEN").expect(
        "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
    );

    // Keep runtime state files in a dedicated folder so the repo root stays tidy.
    let data_dir = "data";
    std::fs::create_dir_all(data_dir).expect("Failed to create data directory for JSON files");

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    let rule_backend = JsonRuleStore::new(format!("{}/rules.json", data_dir));
    let rules = Arc::new(RuleStore::load(rule_backend).await);

    let engine = Arc::new(DecisionEngine::new(
        Arc::clone(&rules),
        exempt_terms_from_env(),
    ));

    let audit_store = JsonAuditStore::new(format!("{}/violations.json", data_dir));
    let blacklist = Arc::new(BlacklistService::new(JsonBlacklistStore::new(format!(
        "{}/blacklist.json",
        data_dir
    ))));

    let clock = Arc::new(MonotonicClock::new());

    let idle_evict_secs = std::env::var("MODGUARD_IDLE_EVICT_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_IDLE_EVICT_SECS);

    // Configure the poise framework with our commands and settings.

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read message content
        | serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            // Register all our commands here
            commands: vec![
                discord::commands::rules::ngword(),
                discord::commands::rules::spamconfig(),
                discord::commands::rules::logchannel(),
                discord::commands::rules::modrole(),
                discord::commands::blacklist::blacklist(),
                discord::commands::blacklist::violations(),
                discord::commands::escalate::timeout(),
                discord::commands::escalate::kick(),
                discord::commands::escalate::ban(),
            ],
            // Event handler for messages and member joins
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                tracing::info!("Registered {} commands", framework.options().commands.len());

                // The action sink needs the gateway's HTTP handle, so the
                // dispatcher is assembled here rather than before startup.
                let sink = DiscordActionSink::new(ctx.http.clone());
                let dispatcher = Arc::new(ActionDispatcher::new(sink, audit_store));

                // Spawn the idle-window sweep so per-user state stays bounded
                let sweep_engine = Arc::clone(&engine);
                let sweep_clock = Arc::clone(&clock);
                tokio::spawn(async move {
                    use std::time::Duration as StdDuration;
                    use tokio::time::sleep;

                    loop {
                        sleep(StdDuration::from_secs(SWEEP_PERIOD_SECS)).await;
                        let evicted =
                            sweep_engine.sweep_idle(sweep_clock.now(), idle_evict_secs as f64);
                        if evicted > 0 {
                            tracing::debug!("Evicted {} idle activity windows", evicted);
                        }
                    }
                });

                Ok(Data {
                    rules,
                    engine,
                    dispatcher,
                    blacklist,
                    clock,
                })
            })
        })
        .build();

    // Create the client and start the bot
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .expect("Error creating client");

    client.start().await.expect("Error running bot");
}

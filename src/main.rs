use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Moderation bot: house roles, intro firewall, support tickets
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Register slash commands in the configured guild instead of globally (faster for testing)
    #[arg(long)]
    guild_commands: bool,

    /// Log at debug level
    #[arg(long, short = 'v')]
    verbose: bool,
}

mod commands;
mod config;
mod cooldown;
mod error;
mod events;
mod gateway;
mod houses;
mod messages;
mod models;
mod reconcile;
mod scheduler;
mod store;
mod util;

#[cfg(test)]
mod testing;

use commands::{help, house, ping};
use config::ConfigBundle;
use cooldown::create_shared_cooldown_registry;
use events::{Dispatcher, MemberJoined, MemberLeft, MessageEvent, ReactionEvent, SharedDispatcher};
use gateway::SerenityGateway;
use scheduler::create_shared_scheduler;
use store::{JsonPlayerStore, SharedPlayerStore};

type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared application state
pub struct Data {
    pub dispatcher: SharedDispatcher,
}

async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    let dispatcher = data.dispatcher.clone();

    // Every event runs on its own task so slow handlers (pacing delays,
    // ticket creation) never hold up the next event
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            ctx.set_activity(Some(serenity::ActivityData::playing(
                dispatcher.config().status_message.clone(),
            )));
            info!("Bot connected as {}", data_about_bot.user.name);
        }
        serenity::FullEvent::Message { new_message } => {
            let event = MessageEvent::from(new_message);
            tokio::spawn(async move {
                if let Err(e) = dispatcher.handle_message(event).await {
                    error!("Failed to handle message: {}", e);
                }
            });
        }
        serenity::FullEvent::ReactionAdd { add_reaction } => {
            let event = ReactionEvent::from(add_reaction);
            tokio::spawn(async move {
                if let Err(e) = dispatcher.handle_reaction_add(event).await {
                    error!("Failed to handle reaction add: {}", e);
                }
            });
        }
        serenity::FullEvent::ReactionRemove { removed_reaction } => {
            let event = ReactionEvent::from(removed_reaction);
            tokio::spawn(async move {
                if let Err(e) = dispatcher.handle_reaction_remove(event).await {
                    error!("Failed to handle reaction remove: {}", e);
                }
            });
        }
        serenity::FullEvent::GuildMemberAddition { new_member } => {
            let event = MemberJoined {
                guild_id: new_member.guild_id,
                user_id: new_member.user.id,
            };
            tokio::spawn(async move {
                if let Err(e) = dispatcher.handle_member_join(event).await {
                    error!("Failed to handle new member: {}", e);
                }
            });
        }
        serenity::FullEvent::GuildMemberRemoval { guild_id, user, .. } => {
            let event = MemberLeft {
                guild_id: *guild_id,
                user_id: user.id,
                tag: user.tag(),
            };
            tokio::spawn(async move {
                if let Err(e) = dispatcher.handle_member_leave(event).await {
                    error!("Failed to handle member removal: {}", e);
                }
            });
        }
        _ => {}
    }
    Ok(())
}

/// Log the application id encoded in the first part of the token
fn log_bot_id(token: &str) {
    use base64::Engine;

    let Some(bot_id_b64) = token.split('.').next() else {
        return;
    };
    // Discord tokens use base64 without padding, sometimes the URL-safe variant
    let decoded = base64::engine::general_purpose::STANDARD_NO_PAD
        .decode(bot_id_b64)
        .or_else(|_| base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(bot_id_b64));
    if let Ok(id_str) = decoded.map(String::from_utf8) {
        if let Ok(id_str) = id_str {
            info!("Bot ID: {} (configure intents at https://discord.com/developers/applications/{}/bot)", id_str, id_str);
        }
    }
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(e) => {
                warn!("Could not listen for SIGTERM: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();

    let level = if args.verbose {
        tracing_subscriber::filter::LevelFilter::DEBUG
    } else {
        tracing_subscriber::filter::LevelFilter::INFO
    };

    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_level(true),
        )
        .with(level)
        .init();

    let token = std::env::var("DISCORD_TOKEN")
        .map_err(|_| anyhow::anyhow!("Missing DISCORD_TOKEN environment variable"))?;
    log_bot_id(&token);

    let data_path = std::env::var("DATA_PATH").unwrap_or_else(|_| "data".to_string());
    let state_path = std::env::var("STATE_PATH").unwrap_or_else(|_| "state".to_string());

    tokio::fs::create_dir_all(&state_path).await?;

    // Startup failures are fatal: no partially configured bot
    info!("Loading configuration from {}...", data_path);
    let bundle = ConfigBundle::load(&data_path)?;

    info!("Opening player store...");
    let players_path = format!("{}/players.json", state_path);
    let store: SharedPlayerStore = Arc::new(JsonPlayerStore::open(&players_path).await?);

    let scheduler = create_shared_scheduler();
    let cooldowns = create_shared_cooldown_registry(scheduler.clone());

    let bot_config = Arc::new(bundle.bot);
    let lang = Arc::new(bundle.lang);
    let assignable_roles = Arc::new(bundle.assignable_roles);
    let guild_id = bot_config.guild_id;
    let guild_commands = args.guild_commands;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![ping(), help(), house()],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            pre_command: |ctx| {
                Box::pin(async move {
                    info!(
                        "Command '{}' invoked by {} (ID: {})",
                        ctx.command().qualified_name,
                        ctx.author().name,
                        ctx.author().id,
                    );
                })
            },
            on_error: |error| {
                Box::pin(async move {
                    match error {
                        poise::FrameworkError::Command { error, ctx, .. } => {
                            error!("Error in command '{}': {}", ctx.command().qualified_name, error);
                            let _ = ctx.say("Une erreur est survenue.").await;
                        }
                        poise::FrameworkError::GuildOnly { ctx, .. } => {
                            warn!("Command '{}' is guild-only, used in DM by {}", ctx.command().qualified_name, ctx.author().name);
                        }
                        other => {
                            error!("Other framework error: {}", other);
                        }
                    }
                })
            },
            ..Default::default()
        })
        .setup({
            let store = store.clone();
            let scheduler = scheduler.clone();
            move |ctx, ready, framework| {
                Box::pin(async move {
                    info!("Bot logged in as: {}", ready.user.name);

                    if guild_commands {
                        info!("Registering commands to guild: {}", guild_id);
                        poise::builtins::register_in_guild(ctx, &framework.options().commands, guild_id)
                            .await?;
                    } else {
                        info!("Registering commands globally...");
                        poise::builtins::register_globally(ctx, &framework.options().commands)
                            .await?;
                    }

                    let gateway = Arc::new(SerenityGateway::new(
                        ctx.http.clone(),
                        ctx.cache.clone(),
                        guild_id,
                    ));

                    let dispatcher = Arc::new(Dispatcher::new(
                        bot_config,
                        lang,
                        assignable_roles,
                        gateway,
                        store,
                        cooldowns,
                        scheduler,
                    ));

                    Ok(Data { dispatcher })
                })
            }
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_MEMBERS;

    let mut client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .await?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        info!("Shutdown signal received, disconnecting...");
        shard_manager.shutdown_all().await;
    });

    info!("Starting bot...");
    let run = client.start().await;

    scheduler.shutdown();
    if let Err(e) = store.flush().await {
        error!("Failed to flush player store: {}", e);
    }

    if let Err(e) = run {
        let err_str = e.to_string();
        if err_str.contains("Disallowed") || err_str.contains("intents") {
            error!("Failed to start bot: {}", e);
            error!("Enable the MESSAGE_CONTENT and GUILD_MEMBERS privileged intents in the Discord Developer Portal");
            return Err(anyhow::anyhow!("Disallowed gateway intents: {}", e));
        }
        return Err(e.into());
    }
    warn!("Bot ended.");

    Ok(())
}

use anyhow::Context as _;
use clap::Parser as _;
use dotenvy::dotenv;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::info;

mod db;
mod modules;
mod services;

#[derive(clap::Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Rollback the specified number of migrations and run all migrations again.
    #[arg(long, num_args = 0..=1, default_missing_value = "1")]
    refresh_migrations: Option<u32>,
}

// Custom user data passed to all command functions and event handlers
pub struct Data {
    pub settings: Arc<services::settings::SettingsProvider>,
    pub invites: Arc<services::invites::InviteTracker>,
    pub logger: Arc<services::logger::LogDispatcher>,
    pub dashboard_url: String,
}

pub type Error = anyhow::Error;
pub type Context<'a> = poise::Context<'a, Data, Error>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let args = Args::parse();

    tracing_subscriber::fmt::init();

    info!("Starting moderation log bot...");

    // Establish database connection
    let db = db::establish_connection()
        .await
        .context("Failed to connect to database")?;

    // Run migrations
    use sea_orm_migration::MigratorTrait;
    if let Some(depth) = args.refresh_migrations {
        info!("Refreshing migrations (down {}, then up)...", depth);
        db::migrations::Migrator::down(&db, Some(depth))
            .await
            .context("Failed to rollback migration")?;
    }

    db::migrations::Migrator::up(&db, None)
        .await
        .context("Failed to run migrations")?;

    if args.refresh_migrations.is_some() {
        info!("Migrations refreshed successfully.");
        std::process::exit(0);
    }

    let token = std::env::var("DISCORD_TOKEN").context("DISCORD_TOKEN missing in .env")?;
    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::GUILD_MODERATION
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    // Settings come from the dashboard's database, or its HTTP API when
    // USE_HTTP_SETTINGS=1.
    let settings = if std::env::var("USE_HTTP_SETTINGS").as_deref() == Ok("1") {
        let base_url = std::env::var("SETTINGS_API_BASE")
            .unwrap_or_else(|_| "http://127.0.0.1:5000".to_string());
        let api_key = std::env::var("BOT_API_KEY").unwrap_or_default();
        Arc::new(services::settings::SettingsProvider::http(base_url, api_key))
    } else {
        Arc::new(services::settings::SettingsProvider::database(db.clone()))
    };

    let invites = Arc::new(services::invites::InviteTracker::new());

    let default_log_channel = std::env::var("LOG_CHANNEL_ID")
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .filter(|id| *id != 0)
        .map(serenity::ChannelId::new);
    let logger = Arc::new(services::logger::LogDispatcher::new(default_log_channel));

    let dashboard_url =
        std::env::var("DASHBOARD_URL").unwrap_or_else(|_| "http://127.0.0.1:5000/".to_string());

    // Guild-scoped command sync for development, global otherwise.
    let command_guild = std::env::var("GUILD_ID")
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .filter(|id| *id != 0)
        .map(serenity::GuildId::new);

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: modules::commands(),
            event_handler: |ctx, event, framework, data| {
                Box::pin(services::event_manager::dispatch(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                match command_guild {
                    Some(guild_id) => {
                        poise::builtins::register_in_guild(
                            ctx,
                            &framework.options().commands,
                            guild_id,
                        )
                        .await?;
                        info!("Synced slash commands to guild {}", guild_id);
                    }
                    None => {
                        poise::builtins::register_globally(ctx, &framework.options().commands)
                            .await?;
                        info!("Synced global slash commands");
                    }
                }

                Ok(Data {
                    settings,
                    invites,
                    logger,
                    dashboard_url,
                })
            })
        })
        .build();

    // Keep recent messages cached so delete/edit logs can recover author
    // and content.
    let mut cache_settings = ::serenity::cache::Settings::default();
    cache_settings.max_messages = 2048;

    let mut client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .cache_settings(cache_settings)
        .await
        .context("Failed to create client")?;

    info!("Bot is ready!");
    client.start_autosharded().await.context("Client error")?;

    Ok(())
}

mod links_commands;
mod posts_commands;
mod users_commands;

use std::{path::PathBuf, sync::Arc, time::Duration};

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    teamsync_config::TeamsyncConfig,
    teamsync_store::{
        BridgeStore, HostServices, MemoryKvStore, SqlBridgeStore, StaticTeamDirectory,
    },
    tracing::{debug, info},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "teamsync", about = "teamsync — inspect and maintain bridge mappings")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to load instead of searching ./ and ~/.config/teamsync/.
    #[arg(long, global = true, env = "TEAMSYNC_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the bridge tables if they do not exist.
    Init,
    /// Channel links.
    Links {
        #[command(subcommand)]
        action: links_commands::LinkAction,
    },
    /// Post mappings.
    Posts {
        #[command(subcommand)]
        action: posts_commands::PostAction,
    },
    /// User identities and tokens.
    Users {
        #[command(subcommand)]
        action: users_commands::UserAction,
    },
    /// Team policy.
    Teams {
        #[command(subcommand)]
        action: TeamAction,
    },
}

#[derive(Subcommand)]
enum TeamAction {
    /// Report whether a local team may bridge under the current config.
    Check {
        /// Local team id.
        team_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_telemetry(&cli);

    let config = load_config(cli.config.as_deref())?;
    let store = open_store(&config).await?;

    match cli.command {
        Commands::Init => {
            // Connecting already bootstrapped the schema.
            info!("bridge schema is ready");
            println!("Bridge tables are ready.");
            Ok(())
        },
        Commands::Links { action } => links_commands::handle_links(&store, action).await,
        Commands::Posts { action } => posts_commands::handle_posts(&store, action).await,
        Commands::Users { action } => users_commands::handle_users(&store, action).await,
        Commands::Teams { action } => handle_teams(&store, action).await,
    }
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<TeamsyncConfig> {
    let config = match path {
        Some(path) => teamsync_config::load_config(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => teamsync_config::discover_and_load(),
    };
    let config = teamsync_config::apply_env_overrides(config)?;
    debug!(
        enabled_teams = ?config.sync.enabled_teams,
        known_teams = config.teams.len(),
        "config loaded"
    );
    Ok(config)
}

/// Open the store with config-backed stand-ins for the host services.
async fn open_store(config: &TeamsyncConfig) -> anyhow::Result<SqlBridgeStore> {
    let enabled = config.sync.enabled_teams.clone();
    let host = HostServices {
        kv: Arc::new(MemoryKvStore::new()),
        teams: Arc::new(StaticTeamDirectory::new(config.teams.clone())),
        enabled_teams: Arc::new(move || enabled.clone()),
    };
    let store = SqlBridgeStore::connect(&config.database, host)
        .await
        .context("failed to open bridge database")?;
    Ok(store.with_avatar_ttl(Duration::from_secs(config.cache.avatar_ttl_secs)))
}

async fn handle_teams(store: &dyn BridgeStore, action: TeamAction) -> anyhow::Result<()> {
    match action {
        TeamAction::Check { team_id } => {
            if store.is_team_enabled(&team_id).await {
                println!("Team {team_id} is enabled.");
            } else {
                println!("Team {team_id} is not enabled.");
            }
            Ok(())
        },
    }
}

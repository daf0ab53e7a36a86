use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use idlewatch_common::traits::{NotificationSink, RegistryStore};
use idlewatch_core::activity::build_activity_source;
use idlewatch_core::config::{ActivitySourceKind, BotConfig};
use idlewatch_core::health_server::start_health_server;
use idlewatch_core::notify::{DiscordNotificationSink, LogOnlyNotificationSink};
use idlewatch_core::platforms::discord::{build_http_client, DiscordPlatform};
use idlewatch_core::platforms::PlatformIntegration;
use idlewatch_core::registry::JsonFileStore;
use idlewatch_core::services::CommandService;
use idlewatch_core::{DefaultHttpClient, HttpClient, InactivityMonitor, UserRegistry};

#[derive(Parser, Debug, Clone)]
#[command(name = "idlewatch")]
#[command(author, version, about = "idlewatch - calls out Discord members who stopped playing LoL")]
struct Args {
    /// Registry file (overrides USERS_FILE)
    #[arg(long)]
    users_file: Option<PathBuf>,

    /// Activity source: riot, opgg or fixed (overrides ACTIVITY_SOURCE)
    #[arg(long)]
    activity_source: Option<String>,

    /// Port for the HTTP status endpoint (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Do not start the HTTP status endpoint
    #[arg(long, default_value = "false")]
    no_http: bool,

    /// Start with monitoring off regardless of MONITORING_ENABLED_AT_STARTUP
    #[arg(long, default_value = "false")]
    monitoring_off: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("idlewatch=info,idlewatch_core=info,idlewatch_server=info"));
    let sub = fmt().with_env_filter(filter).finish();
    if tracing::subscriber::set_global_default(sub).is_err() {
        eprintln!("A global tracing subscriber was already set");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();
    let args = Args::parse();

    let mut config = BotConfig::from_env()?;
    if let Some(path) = args.users_file.clone() {
        config.users_file = path;
    }
    if let Some(kind) = args.activity_source.as_deref() {
        config.activity_source = kind.parse::<ActivitySourceKind>()?;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if args.monitoring_off {
        config.monitor.enabled_at_startup = false;
    }
    info!(
        "idlewatch starting. users_file={:?}, source={:?}, port={}",
        config.users_file, config.activity_source, config.port
    );

    run(config, args.no_http).await
}

async fn run(config: BotConfig, no_http: bool) -> anyhow::Result<()> {
    // 1) Registry
    let store: Arc<dyn RegistryStore> = Arc::new(JsonFileStore::new(config.users_file.clone()));
    let registry = Arc::new(UserRegistry::load(store));

    // 2) Activity lookup
    let api_http: Arc<dyn HttpClient> = Arc::new(DefaultHttpClient::new());
    let source = build_activity_source(&config, api_http);

    // 3) Delivery; falls back to log-only when Discord cannot be reached
    let discord_http = config.discord_token.as_deref().map(build_http_client);
    let sink: Arc<dyn NotificationSink> = match (&discord_http, config.can_deliver()) {
        (Some(http), true) => Arc::new(DiscordNotificationSink::new(http.clone(), config.guild_id)),
        _ => {
            warn!("Notifications will only be written to the log");
            Arc::new(LogOnlyNotificationSink)
        }
    };

    // 4) Monitor + commands
    let monitor = InactivityMonitor::new(registry, source, sink, config.monitor.clone());
    monitor.start();
    let commands = Arc::new(CommandService::new(monitor.clone()));

    // 5) Discord gateway
    let mut platform = match (&config.discord_token, discord_http) {
        (Some(token), Some(http)) => {
            let mut platform = DiscordPlatform::new(token.clone(), config.guild_id, http, commands.clone());
            match platform.connect().await {
                Ok(()) => Some(platform),
                Err(e) => {
                    error!("Discord connection failed; continuing without commands: {:?}", e);
                    None
                }
            }
        }
        _ => None,
    };

    // 6) HTTP status endpoint
    let http_server = if no_http {
        None
    } else {
        match start_health_server(config.port, monitor.clone()).await {
            Ok(server) => Some(server),
            Err(e) => {
                error!("Could not start HTTP server on port {}: {:?}", config.port, e);
                None
            }
        }
    };

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {:?}", e);
    }
    info!("Ctrl-C detected, shutting down...");

    monitor.disable();
    if let Some(p) = platform.as_mut() {
        if let Err(e) = p.disconnect().await {
            warn!("Discord disconnect error: {:?}", e);
        }
    }
    if let Some((handle, shutdown)) = http_server {
        let _ = shutdown.send(());
        let _ = handle.await;
    }

    info!("Main finished. Goodbye!");
    Ok(())
}

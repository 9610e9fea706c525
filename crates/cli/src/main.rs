use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use {
    clap::{Parser, Subcommand},
    sqlx::{
        SqlitePool,
        sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    },
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    vignette_config::VignetteConfig,
    vignette_gateway::AppState,
    vignette_media::{ImageService, MediaStorage, ServiceOptions},
    vignette_store::{ImageStore, SqliteImageStore},
};

#[derive(Parser)]
#[command(name = "vignette", about = "Vignette — image ingestion and thumbnail service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,
    /// Port to listen on (overrides config value).
    #[arg(long, global = true)]
    port: Option<u16>,
    /// Custom data directory (overrides config and the default data dir).
    #[arg(long, global = true, env = "VIGNETTE_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default when no subcommand is provided).
    Serve,
    /// Print record statistics and exit.
    Stats,
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
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "vignette starting");

    let config = vignette_config::discover_and_load();
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.storage.resolve_data_dir());

    match cli.command {
        None | Some(Commands::Serve) => serve(cli, config, data_dir).await,
        Some(Commands::Stats) => stats(&data_dir).await,
    }
}

/// Open (creating if missing) the record database under `data_dir`.
async fn open_pool(data_dir: &Path) -> anyhow::Result<SqlitePool> {
    std::fs::create_dir_all(data_dir)?;
    let opts = SqliteConnectOptions::new()
        .filename(data_dir.join("vignette.db"))
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(opts).await?;
    SqliteImageStore::init(&pool).await?;
    Ok(pool)
}

async fn serve(cli: Cli, config: VignetteConfig, data_dir: PathBuf) -> anyhow::Result<()> {
    // CLI args override config values.
    let bind = cli.bind.unwrap_or(config.server.bind);
    let port = cli.port.unwrap_or(config.server.port);

    let pool = open_pool(&data_dir).await?;
    let store = Arc::new(SqliteImageStore::new(pool));

    let storage = MediaStorage::new(&data_dir);
    let options = ServiceOptions {
        max_bytes: config.ingest.max_bytes,
        timeout: Duration::from_secs(config.ingest.timeout_secs),
        thumbnail_sizes: config.ingest.thumbnail_sizes,
    };
    let service = Arc::new(ImageService::new(storage.clone(), store, options)?);

    info!(path = %data_dir.display(), "storage directory");

    let state = AppState {
        service,
        images_dir: storage.images_dir(),
    };
    vignette_gateway::start_server(&bind, port, state).await
}

async fn stats(data_dir: &Path) -> anyhow::Result<()> {
    let pool = open_pool(data_dir).await?;
    let store = SqliteImageStore::new(pool);

    let count = store.count().await?;
    let max_id = store.max_id().await?;
    println!("images:  {count}");
    match max_id {
        Some(id) => println!("max id:  {id}"),
        None => println!("max id:  (none)"),
    }
    Ok(())
}

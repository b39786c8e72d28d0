use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::info;
use oxidized_transfer::{
    config::Config,
    lifecycle,
    routes::create_router,
    utils::init_logger,
    AppState, StorageDir,
};

/// File transfer server - upload, list and download files over HTTP.
#[derive(Parser, Debug)]
#[command(name = "oxidized-transfer")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Address to bind (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory holding uploaded files (overrides UPLOAD_DIR)
    #[arg(long, value_name = "DIR")]
    upload_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::from_env()?;
    config.apply_overrides(cli.host, cli.port, cli.upload_dir);

    // Initialize tracing; the guard keeps the file writer alive
    let _log_guard = init_logger(config.logging.log_dir.as_deref());
    info!("Configuration loaded: {:?}", config);

    // Prepare the upload directory before accepting any request
    let storage = StorageDir::new(&config.storage.upload_dir);
    lifecycle::on_startup(&storage)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to prepare upload directory: {}", e))?;

    let state = AppState::new(storage.clone(), config.clone());
    let app = create_router(state);

    // Start server
    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(lifecycle::shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    lifecycle::on_shutdown(&storage).await;

    Ok(())
}

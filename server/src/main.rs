use clap::Parser;
use env_logger::Env;
use intake_server::auth::AuthGate;
use intake_server::config::{ServerConfig, DEFAULT_DATABASE};
use intake_server::network::Server;
use intake_server::service::IntakeService;
use intake_server::store::ApplicationStore;
use intake_shared::{DEFAULT_HOST, DEFAULT_PORT};
use log::{debug, info};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Admissions intake server")]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = DEFAULT_HOST)]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Shared secret every submission must carry
    #[arg(long, env = "INTAKE_AUTH_KEY", hide_env_values = true)]
    auth_key: String,

    /// SQLite database file
    #[arg(short, long, env = "INTAKE_DATABASE", default_value = DEFAULT_DATABASE)]
    database: PathBuf,

    /// Quiet period (ms) that ends a request
    #[arg(long, default_value_t = 1000)]
    idle_window_ms: u64,

    /// Total time (s) allowed to receive one request
    #[arg(long, default_value_t = 30)]
    request_deadline_secs: u64,

    /// Time (s) shutdown waits for open connections before aborting them
    #[arg(long, default_value_t = 10)]
    drain_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = ServerConfig {
        host: args.host,
        port: args.port,
        auth_key: args.auth_key,
        database: args.database,
        idle_window: Duration::from_millis(args.idle_window_ms),
        request_deadline: Duration::from_secs(args.request_deadline_secs),
        drain_timeout: Duration::from_secs(args.drain_timeout_secs),
    };

    let store = ApplicationStore::open(&config.database)?;
    info!("Database initialized at {}", store.path().display());

    let service = IntakeService::new(AuthGate::new(config.auth_key.clone()), store);
    let server = Server::bind(&config, service).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut server_handle = tokio::spawn(server.run(shutdown_rx));

    info!("Press Ctrl+C to stop the server");

    tokio::select! {
        result = &mut server_handle => {
            result??;
            return Ok(());
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
            if let Err(e) = shutdown_tx.send(true) {
                debug!("Server task already gone: {}", e);
            }
        }
    }

    server_handle.await??;
    Ok(())
}

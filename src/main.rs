use clap::Parser;
use speed_proxy::config::{Args, Config};
use speed_proxy::web::WebServer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    // Missing or malformed parameters never reach the serving state.
    let config = match Config::from_args(args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let server = match WebServer::new(config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to init server: {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {:#}", e);
        std::process::exit(1);
    }
}

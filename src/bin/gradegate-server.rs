#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Receives score reports uploaded by `gradegate grade`.

use anyhow::{Context, Result};
use dotenvy::dotenv;
use gradegate::server::{ServerConfig, serve};
use tokio::net::TcpListener;
use tracing::{Level, metadata::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false);
    let filter_layer = LevelFilter::from_level(Level::INFO);
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    let config = ServerConfig::from_env();
    let listener = TcpListener::bind(&config.http)
        .await
        .with_context(|| format!("Could not bind {}", config.http))?;
    serve(listener, config).await
}

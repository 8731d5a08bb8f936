//! Stepwise visualization server binary
//!
//! Run with: cargo run -p stepwise-vis --bin stepwise-vis
//! Then open: http://localhost:3000

use stepwise_vis::{ServerConfig, VisServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stepwise_vis=info,stepwise_replay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    tracing::info!(
        addr = %config.addr,
        base_delay_ms = config.playback.base_delay.as_millis() as u64,
        "starting stepwise visualizer"
    );

    VisServer::new(config).serve().await?;
    Ok(())
}

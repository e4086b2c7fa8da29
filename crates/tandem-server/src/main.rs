use std::sync::Arc;

use tandem_server::{RelayHub, ServerConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tandem_server=info,tower_http=info".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let hub = Arc::new(RelayHub::new(config.channel_capacity));

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    let addr = listener.local_addr()?;
    info!("Tandem relay server listening on {}", addr);
    info!("WebSocket endpoint: ws://localhost:{}/ws", addr.port());

    tandem_server::serve(listener, hub).await?;
    Ok(())
}

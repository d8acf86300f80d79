use mock_service::GatewayState;
use std::net::SocketAddr;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mock_service=info,tower_http=warn")),
        )
        .init();

    let addr: SocketAddr = std::env::var("MOCK_GATEWAY_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        .parse()?;

    let state = GatewayState::new();
    state.seed_products(20);
    state.seed_categories(5);
    state.set_latency(Duration::from_millis(20), Duration::from_millis(5));

    tokio::spawn(mock_service::request_rate_task(state.clone()));

    mock_service::run(addr, state).await
}

use clap::Parser;
use ecommerce_load::{Args, Gateway, LoadTest};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ecommerce_load=info")),
        )
        .init();

    if let Some(addr) = args.metrics_addr {
        #[cfg(feature = "metrics")]
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;

        #[cfg(not(feature = "metrics"))]
        tracing::warn!("Built without the `metrics` feature, not serving metrics on {addr}");
    }

    let gateway = Gateway::new(&args.host)?;
    let stats = LoadTest::with_config(gateway, args.load_test_config()).await?;

    println!("{stats}");
    Ok(())
}

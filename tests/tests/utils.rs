use ecommerce_load::transaction::record_into;
use ecommerce_load::{Gateway, StatsRegistry};
use mock_service::GatewayState;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

/// A fresh mock gateway per test, plus a stats registry the test's transactions record into.
pub struct Harness {
    pub gateway: Gateway,
    pub state: Arc<GatewayState>,
    pub stats: Arc<StatsRegistry>,
}

#[allow(unused)]
impl Harness {
    pub async fn record<F: Future>(&self, fut: F) -> F::Output {
        record_into(self.stats.clone(), fut).await
    }
}

#[allow(unused)]
pub async fn init() -> Harness {
    let state = GatewayState::new();
    let addr = mock_service::spawn("127.0.0.1:0".parse::<SocketAddr>().unwrap(), state.clone())
        .await
        .unwrap();

    Harness {
        gateway: Gateway::new(&format!("http://{addr}")).unwrap(),
        state,
        stats: Arc::new(StatsRegistry::default()),
    }
}

/// A gateway pointing at a port nothing listens on.
#[allow(unused)]
pub async fn unreachable_gateway() -> Gateway {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Gateway::new(&format!("http://{addr}")).unwrap()
}

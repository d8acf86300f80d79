use crate::stats::StatsRegistry;
use governor::DefaultDirectRateLimiter;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// Transaction hook used by the `#[transaction]` macro. Not intended to be used manually.
pub async fn transaction_hook<T, R, E>(name: &'static str, func: T) -> T::Output
where
    T: Future<Output = Result<R, E>>,
    E: Display,
{
    if let Ok(hook) = TRANSACTION_HOOK.try_with(|v| v.clone()) {
        if let Some(limiter) = &hook.limiter {
            limiter.until_ready().await;
        }

        let start = Instant::now();
        let res = func.await;
        let elapsed = start.elapsed();

        #[cfg(feature = "metrics")]
        {
            metrics::histogram!("ecommerce_load_request_latency", "request" => name)
                .record(elapsed.as_secs_f64());
            let outcome = if res.is_ok() { "success" } else { "failure" };
            metrics::counter!("ecommerce_load_requests", "request" => name, "outcome" => outcome)
                .increment(1);
        }

        match &res {
            Ok(_) => {
                tracing::trace!("{name} succeeded in {elapsed:?}");
                hook.stats.record_success(name, elapsed);
            }
            Err(err) => {
                let reason = err.to_string();
                tracing::debug!("{name} failed in {elapsed:?}: {reason}");
                hook.stats.record_failure(name, elapsed, reason);
            }
        }

        res
    } else {
        tracing::debug!("No hook available, {name} is not recorded.");
        func.await
    }
}

#[derive(Clone)]
pub(crate) struct TransactionData {
    pub limiter: Option<Arc<DefaultDirectRateLimiter>>,
    pub stats: Arc<StatsRegistry>,
}

tokio::task_local! {
    pub(crate) static TRANSACTION_HOOK: TransactionData;
}

/// Runs `fut` with every transaction it performs recorded into `stats`.
pub async fn record_into<F: Future>(stats: Arc<StatsRegistry>, fut: F) -> F::Output {
    TRANSACTION_HOOK
        .scope(
            TransactionData {
                limiter: None,
                stats,
            },
            fut,
        )
        .await
}

//! Runs simulated users against the gateway.
use crate::config::LoadTestConfig;
use crate::error::ConfigError;
use crate::gateway::Gateway;
use crate::session::EcommerceUser;
use crate::stats::{RunStatistics, StatsRegistry};
use crate::tasks::{TaskPicker, TASKS};
use crate::timer::Timer;
use crate::transaction::{TransactionData, TRANSACTION_HOOK};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::{
    future::Future,
    num::NonZeroU32,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::Duration,
};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
#[allow(unused_imports)]
use tracing::{debug, error, info, info_span, instrument, trace, warn, Instrument};

/// Load test handle.
///
/// Configure with the builder methods, then `.await` it to run.
///
/// # Example
/// ```no_run
/// use ecommerce_load::prelude::*;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let gateway = Gateway::new("http://localhost:8080").unwrap();
///     let stats = LoadTest::new(gateway)
///         .users(10)
///         .duration(Duration::from_secs(120))
///         .await
///         .unwrap();
///     println!("{stats}");
/// }
/// ```
pub struct LoadTest {
    gateway: Gateway,
    config: LoadTestConfig,
    runner_fut: Option<Pin<Box<dyn Future<Output = Result<RunStatistics, ConfigError>> + Send>>>,
}

impl LoadTest {
    pub fn new(gateway: Gateway) -> Self {
        Self::with_config(gateway, LoadTestConfig::default())
    }

    pub fn with_config(gateway: Gateway, config: LoadTestConfig) -> Self {
        Self {
            gateway,
            config,
            runner_fut: None,
        }
    }

    pub fn users(mut self, users: usize) -> Self {
        self.config.users = users;
        self
    }

    /// Users started per second until all are running.
    pub fn spawn_rate(mut self, spawn_rate: f64) -> Self {
        self.config.spawn_rate = spawn_rate;
        self
    }

    /// Run for the given duration. Without one the test runs until Ctrl-C.
    pub fn duration(mut self, duration: Duration) -> Self {
        self.config.duration = Some(duration);
        self
    }

    /// Pause between two tasks of a user, drawn uniformly from `min..=max`.
    pub fn wait_time(mut self, min: Duration, max: Duration) -> Self {
        self.config.min_wait = min;
        self.config.max_wait = max;
        self
    }

    /// Cap the combined request rate of all users.
    pub fn max_tps(mut self, tps: NonZeroU32) -> Self {
        self.config.max_tps = Some(tps);
        self
    }

    pub fn report_interval(mut self, interval: Duration) -> Self {
        self.config.report_interval = interval;
        self
    }
}

impl Future for LoadTest {
    type Output = Result<RunStatistics, ConfigError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.runner_fut.is_none() {
            let gateway = self.gateway.clone();
            let config = self.config.clone();
            self.runner_fut = Some(Box::pin(run_load_test(gateway, config)));
        }

        match &mut self.runner_fut {
            Some(runner) => runner.as_mut().poll(cx),
            None => unreachable!(),
        }
    }
}

#[instrument(name = "load_test", skip_all, fields(host = gateway.host()))]
pub(crate) async fn run_load_test(
    gateway: Gateway,
    config: LoadTestConfig,
) -> Result<RunStatistics, ConfigError> {
    config.validate()?;
    let spawn_interval = config.spawn_interval()?;
    let picker = TaskPicker::new(&TASKS)?;
    let wait = Uniform::new_inclusive(config.min_wait, config.max_wait);

    info!("Running load test with config {:?}", &config);

    let stats = Arc::new(StatsRegistry::default());
    let transaction_data = TransactionData {
        limiter: config.max_tps.map(|tps| Arc::new(rate_limiter(tps))),
        stats: stats.clone(),
    };

    let start = Instant::now();
    let deadline = config.duration.map(|d| start + d);
    let stop = stop_signal(deadline);
    tokio::pin!(stop);

    let mut spawn_timer = interval(spawn_interval);
    spawn_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut report_timer = Timer::new(config.report_interval).await;
    info!("Reporting statistics every {report_timer}");

    let mut users: Vec<JoinHandle<()>> = vec![];
    loop {
        tokio::select! {
            _ = &mut stop => break,
            _ = spawn_timer.tick(), if users.len() < config.users => {
                let user = spawn_user(
                    users.len(),
                    gateway.clone(),
                    picker.clone(),
                    wait.clone(),
                    transaction_data.clone(),
                );
                users.push(user);
                if users.len() == config.users {
                    info!("All {} users spawned", users.len());
                }
            }
            _ = report_timer.tick() => {
                info!("\n{}", stats.snapshot(users.len(), start.elapsed()));
            }
        }
    }

    let user_count = users.len();
    for handle in &users {
        handle.abort();
    }
    // Nothing may record into `stats` once the final snapshot is taken.
    for handle in users {
        if let Err(err) = handle.await {
            if !err.is_cancelled() {
                error!("User task failed: {err}");
            }
        }
    }

    info!("Load test complete");

    Ok(stats.snapshot(user_count, start.elapsed()))
}

fn spawn_user(
    id: usize,
    gateway: Gateway,
    picker: TaskPicker,
    wait: Uniform<Duration>,
    transaction_data: TransactionData,
) -> JoinHandle<()> {
    let span = info_span!("user", id);
    tokio::spawn(TRANSACTION_HOOK.scope(
        transaction_data,
        async move {
            let mut rng = SmallRng::from_entropy();
            let mut user = EcommerceUser::new(gateway);
            user.on_start().await;

            loop {
                let task = picker.pick(&mut rng);
                user.run(task).await;
                tokio::time::sleep(wait.sample(&mut rng)).await;
            }
        }
        .instrument(span),
    ))
}

/// Resolves at `deadline` or on Ctrl-C, whichever comes first.
async fn stop_signal(deadline: Option<Instant>) {
    let deadline = async {
        match deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        _ = deadline => {}
        _ = ctrl_c() => info!("Ctrl-C received, stopping"),
    }
}

async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Unable to listen for Ctrl-C: {err}");
        std::future::pending::<()>().await
    }
}

fn rate_limiter(tps_limit: NonZeroU32) -> DefaultDirectRateLimiter {
    RateLimiter::direct(Quota::per_second(tps_limit))
}

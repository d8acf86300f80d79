use crate::error::ConfigError;
use clap::Parser;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "http://localhost:8080";
pub const DEFAULT_MIN_WAIT: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(3);
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Clone, Debug, PartialEq)]
pub struct LoadTestConfig {
    pub users: usize,
    /// Users started per second until `users` are running.
    pub spawn_rate: f64,
    /// `None` runs until Ctrl-C.
    pub duration: Option<Duration>,
    pub min_wait: Duration,
    pub max_wait: Duration,
    /// Cap on requests per second across all users.
    pub max_tps: Option<NonZeroU32>,
    pub report_interval: Duration,
}

impl Default for LoadTestConfig {
    fn default() -> Self {
        Self {
            users: 1,
            spawn_rate: 1.,
            duration: None,
            min_wait: DEFAULT_MIN_WAIT,
            max_wait: DEFAULT_MAX_WAIT,
            max_tps: None,
            report_interval: DEFAULT_REPORT_INTERVAL,
        }
    }
}

impl LoadTestConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.users == 0 {
            return Err(ConfigError::NoUsers);
        }
        self.spawn_interval()?;
        if self.min_wait > self.max_wait {
            return Err(ConfigError::InvalidWaitTime {
                min: self.min_wait,
                max: self.max_wait,
            });
        }
        if self.report_interval.is_zero() {
            return Err(ConfigError::InvalidReportInterval);
        }
        Ok(())
    }

    /// Pause between two user spawns. The rate must map to a non-zero, representable `Duration`.
    pub(crate) fn spawn_interval(&self) -> Result<Duration, ConfigError> {
        let invalid = || ConfigError::InvalidSpawnRate(self.spawn_rate);
        if !(self.spawn_rate.is_finite() && self.spawn_rate > 0.) {
            return Err(invalid());
        }
        match Duration::try_from_secs_f64(1. / self.spawn_rate) {
            Ok(interval) if !interval.is_zero() => Ok(interval),
            _ => Err(invalid()),
        }
    }
}

/// Simulated e-commerce traffic against the API gateway.
#[derive(Parser, Debug)]
#[command(version)]
pub struct Args {
    /// Base URL of the API gateway
    #[arg(long, env = "ECOMMERCE_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Number of concurrent simulated users
    #[arg(short, long, default_value_t = 1)]
    pub users: usize,

    /// Users started per second
    #[arg(short = 'r', long, default_value_t = 1.)]
    pub spawn_rate: f64,

    /// Stop after this long (e.g. `90s`, `5m`); runs until Ctrl-C otherwise
    #[arg(short = 't', long, value_parser = humantime::parse_duration)]
    pub run_time: Option<Duration>,

    /// Shortest pause between two tasks of one user
    #[arg(long, value_parser = humantime::parse_duration, default_value = "1s")]
    pub min_wait: Duration,

    /// Longest pause between two tasks of one user
    #[arg(long, value_parser = humantime::parse_duration, default_value = "3s")]
    pub max_wait: Duration,

    /// Cap on total requests per second
    #[arg(long)]
    pub max_tps: Option<NonZeroU32>,

    /// How often to log intermediate statistics
    #[arg(long, value_parser = humantime::parse_duration, default_value = "10s")]
    pub report_interval: Duration,

    /// Serve Prometheus metrics on this address
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,
}

impl Args {
    pub fn load_test_config(&self) -> LoadTestConfig {
        LoadTestConfig {
            users: self.users,
            spawn_rate: self.spawn_rate,
            duration: self.run_time,
            min_wait: self.min_wait,
            max_wait: self.max_wait,
            max_tps: self.max_tps,
            report_interval: self.report_interval,
        }
    }
}

//! Per-request statistics collected by the transaction hook.
use metrics_util::AtomicBucket;
use pdatastructs::tdigest::{TDigest, K1};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tracing::error;

const TDIGEST_BACKLOG_SIZE: usize = 100;

struct RequestStats {
    success: AtomicU64,
    failure: AtomicU64,
    latency: AtomicBucket<Duration>,
    failures: Mutex<BTreeMap<String, u64>>,
}

impl Default for RequestStats {
    fn default() -> Self {
        Self {
            success: AtomicU64::new(0),
            failure: AtomicU64::new(0),
            latency: AtomicBucket::new(),
            failures: Mutex::new(BTreeMap::new()),
        }
    }
}

/// Outcome counters for a single request name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestCounts {
    pub success: u64,
    pub failure: u64,
    pub failures: BTreeMap<String, u64>,
}

impl RequestCounts {
    pub fn total(&self) -> u64 {
        self.success + self.failure
    }
}

/// Shared registry of request outcomes, keyed by request name.
#[derive(Default)]
pub struct StatsRegistry {
    requests: RwLock<BTreeMap<&'static str, Arc<RequestStats>>>,
}

impl StatsRegistry {
    fn entry(&self, name: &'static str) -> Arc<RequestStats> {
        if let Some(stats) = self
            .requests
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return stats.clone();
        }

        self.requests
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name)
            .or_default()
            .clone()
    }

    pub fn record_success(&self, name: &'static str, latency: Duration) {
        let stats = self.entry(name);
        stats.success.fetch_add(1, Ordering::Relaxed);
        stats.latency.push(latency);
    }

    pub fn record_failure(&self, name: &'static str, latency: Duration, reason: String) {
        let stats = self.entry(name);
        stats.failure.fetch_add(1, Ordering::Relaxed);
        stats.latency.push(latency);
        *stats
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(reason)
            .or_insert(0) += 1;
    }

    pub fn counts(&self, name: &str) -> Option<RequestCounts> {
        let requests = self.requests.read().unwrap_or_else(PoisonError::into_inner);
        requests.get(name).map(|stats| counts(stats))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.requests
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }

    /// Cumulative snapshot of every request seen so far.
    pub fn snapshot(&self, users: usize, elapsed: Duration) -> RunStatistics {
        let requests = self.requests.read().unwrap_or_else(PoisonError::into_inner);
        let requests = requests
            .iter()
            .map(|(name, stats)| {
                let mut measurement = Measurement::new(counts(stats), elapsed);
                stats
                    .latency
                    .data_with(|dur| measurement.populate_latencies(dur));
                (*name, measurement)
            })
            .collect();

        RunStatistics {
            users,
            elapsed,
            requests,
        }
    }
}

fn counts(stats: &RequestStats) -> RequestCounts {
    RequestCounts {
        success: stats.success.load(Ordering::Relaxed),
        failure: stats.failure.load(Ordering::Relaxed),
        failures: stats
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone(),
    }
}

#[derive(Debug, Clone)]
pub struct Measurement {
    pub counts: RequestCounts,
    pub rps: f64,
    pub error_rate: f64,
    samples: usize,
    latency: TDigest<K1>,
}

impl Measurement {
    pub fn new(counts: RequestCounts, elapsed: Duration) -> Self {
        let total = counts.total();
        let secs = elapsed.as_secs_f64();
        let rps = if secs > 0. { total as f64 / secs } else { 0. };
        let error_rate = if total > 0 {
            counts.failure as f64 / total as f64
        } else {
            0.
        };

        Self {
            counts,
            rps,
            error_rate,
            samples: 0,
            latency: default_tdigest(),
        }
    }

    pub fn populate_latencies(&mut self, dur: &[Duration]) {
        for latency in dur {
            self.latency.insert(latency.as_secs_f64());
        }
        self.samples += dur.len();
    }

    pub fn latency(&self, quantile: f64) -> Duration {
        if self.samples == 0 {
            return Duration::ZERO;
        }

        let secs = self.latency.quantile(quantile);

        // TDigest can hand back NaN for degenerate inputs.
        let secs = if secs.is_finite() && secs >= 0. {
            secs
        } else {
            error!("NaN Latency Calculation.");
            0.
        };

        Duration::from_secs_f64(secs)
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OK={}, Failed={}, RPS={:.2}, ErrorRate={:.2}, p50={:?}, p90={:?}, p99={:?}",
            self.counts.success,
            self.counts.failure,
            self.rps,
            self.error_rate,
            self.latency(0.5),
            self.latency(0.90),
            self.latency(0.99),
        )
    }
}

fn default_tdigest() -> TDigest<K1> {
    TDigest::new(K1::new(10.), TDIGEST_BACKLOG_SIZE)
}

/// Statistics of a load test run, per request name.
#[derive(Debug, Clone)]
pub struct RunStatistics {
    pub users: usize,
    pub elapsed: Duration,
    pub requests: BTreeMap<&'static str, Measurement>,
}

impl RunStatistics {
    pub fn get(&self, name: &str) -> Option<&Measurement> {
        self.requests.get(name)
    }

    pub fn total_success(&self) -> u64 {
        self.requests.values().map(|m| m.counts.success).sum()
    }

    pub fn total_failure(&self) -> u64 {
        self.requests.values().map(|m| m.counts.failure).sum()
    }
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} users, {}",
            self.users,
            humantime::format_duration(Duration::from_secs(self.elapsed.as_secs()))
        )?;
        for (name, measurement) in &self.requests {
            writeln!(f, "{name:<32} {measurement}")?;
        }
        writeln!(
            f,
            "{:<32} OK={}, Failed={}",
            "Aggregated",
            self.total_success(),
            self.total_failure()
        )?;

        let failures: Vec<_> = self
            .requests
            .iter()
            .flat_map(|(name, m)| {
                m.counts
                    .failures
                    .iter()
                    .map(move |(reason, count)| (name, reason, count))
            })
            .collect();
        if !failures.is_empty() {
            writeln!(f, "Failures:")?;
            for (name, reason, count) in failures {
                writeln!(f, "  {count:>6}  {name}: {reason}")?;
            }
        }
        Ok(())
    }
}

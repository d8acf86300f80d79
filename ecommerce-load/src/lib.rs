#![doc = include_str!("../README.md")]

// Lets `#[transaction]` expansions inside this crate resolve `::ecommerce_load`.
extern crate self as ecommerce_load;

pub mod config;
pub mod error;
pub mod gateway;
pub mod payload;
pub mod requests;
pub mod runner;
pub mod session;
pub mod stats;
pub mod tasks;
#[doc(hidden)]
pub mod transaction;

pub(crate) mod timer;

pub use config::{Args, LoadTestConfig};
pub use ecommerce_load_macros::transaction;
pub use error::{ConfigError, RequestError};
pub use gateway::Gateway;
pub use payload::Id;
pub use runner::LoadTest;
pub use session::EcommerceUser;
pub use stats::{RunStatistics, StatsRegistry};

pub mod prelude {
    pub use crate::config::LoadTestConfig;
    pub use crate::error::{ConfigError, RequestError};
    pub use crate::gateway::Gateway;
    pub use crate::payload::Id;
    pub use crate::runner::LoadTest;
    pub use crate::session::EcommerceUser;
    pub use crate::stats::RunStatistics;
    pub use crate::tasks::{TaskKind, TASKS};
    pub use ecommerce_load_macros::transaction;
}

//! loadforge: fan out a fixed number of HTTP GET requests under a concurrency
//! budget and reduce their outcomes into a single latency report.

pub mod client;
pub mod executor;
pub mod models;
pub mod utils;

pub use client::{HttpRequester, Requester};
pub use executor::{print_banner, print_report, render_report, run_load_test};
pub use models::config::{ConfigError, RunConfig, RunSettings};
pub use models::metrics::{Report, ReportBuilder};
pub use models::outcome::{Outcome, RequestError};

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::client::Requester;
use crate::models::config::RunConfig;
use crate::models::metrics::{Report, ReportBuilder};
use crate::models::outcome::{Outcome, RequestError};

mod output;

pub use output::{print_banner, print_report, render_report};

/// Run `config.total_requests()` requests against `config.url()` with at most
/// `config.concurrency()` of them in flight, and reduce every outcome into a
/// [`Report`]. Individual request failures never abort the run.
pub async fn run_load_test<R: Requester>(requester: Arc<R>, config: &RunConfig) -> Report {
    let total_requests = config.total_requests();
    let concurrency = config.concurrency();
    let permits = usize::try_from(concurrency)
        .unwrap_or(Semaphore::MAX_PERMITS)
        .min(Semaphore::MAX_PERMITS);

    let gate = Arc::new(Semaphore::new(permits));
    let url: Arc<str> = Arc::from(config.url());
    let mut units = JoinSet::new();
    let mut builder = ReportBuilder::new(total_requests, concurrency);

    info!(
        target_url = %url,
        total_requests,
        concurrency,
        "Dispatching requests"
    );

    let start = Instant::now();

    for _ in 0..total_requests {
        let requester = Arc::clone(&requester);
        let gate = Arc::clone(&gate);
        let url = Arc::clone(&url);

        units.spawn(async move {
            // Held until the request returns; dropping it frees the slot on every path.
            let _permit = match gate.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    return Outcome::failed(
                        RequestError::Transport(format!("admission gate closed: {e}")),
                        Duration::ZERO,
                    )
                }
            };
            requester.execute(&url).await
        });
    }

    while let Some(joined) = units.join_next().await {
        let outcome = match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "Request unit did not complete");
                Outcome::failed(RequestError::Panicked(e.to_string()), Duration::ZERO)
            }
        };
        builder.record(outcome);
        debug!(completed = builder.recorded(), total_requests, "Collected outcome");
    }

    let total_duration = start.elapsed();
    let report = builder.finish(total_duration);

    info!(
        total_duration_ms = total_duration.as_millis() as u64,
        successful = report.successful_requests,
        failed = report.failed_requests,
        "Load test finished"
    );

    report
}

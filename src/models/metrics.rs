use std::collections::HashMap;
use std::time::Duration;

use chrono::Local;

use crate::models::outcome::Outcome;

const HTTP_OK: u16 = 200;

/// Timings cover responses only; `None` means no response was received.
#[derive(Debug, Clone)]
pub struct Report {
    pub total_requests: u64,
    pub concurrency: u64,
    pub total_duration: Duration,

    pub successful_requests: u64,
    pub failed_requests: u64,
    pub status_code_counts: HashMap<u16, u64>,
    pub error_counts: HashMap<&'static str, u64>,

    pub average_duration: Option<Duration>,
    pub min_duration: Option<Duration>,
    pub max_duration: Option<Duration>,
    pub median_duration: Option<Duration>,

    pub timestamp: String,
}

impl Report {
    /// True when at least one request produced an HTTP response.
    pub fn has_samples(&self) -> bool {
        self.average_duration.is_some()
    }

    pub fn requests_per_second(&self) -> f64 {
        let secs = self.total_duration.as_secs_f64();
        if secs > 0.0 {
            self.total_requests as f64 / secs
        } else {
            0.0
        }
    }

    pub fn non_200_responses(&self) -> u64 {
        self.status_code_counts
            .iter()
            .filter(|(code, _)| **code != HTTP_OK)
            .map(|(_, count)| count)
            .sum()
    }

    pub fn accounted_requests(&self) -> u64 {
        self.successful_requests + self.non_200_responses() + self.failed_requests
    }
}

#[derive(Debug)]
pub struct ReportBuilder {
    total_requests: u64,
    concurrency: u64,
    recorded: u64,

    successful_requests: u64,
    failed_requests: u64,
    status_code_counts: HashMap<u16, u64>,
    error_counts: HashMap<&'static str, u64>,

    total_nanos: u128,
    fastest: Option<Duration>,
    slowest: Option<Duration>,
    response_times: Vec<Duration>,
}

impl ReportBuilder {
    pub fn new(total_requests: u64, concurrency: u64) -> Self {
        Self {
            total_requests,
            concurrency,
            recorded: 0,
            successful_requests: 0,
            failed_requests: 0,
            status_code_counts: HashMap::new(),
            error_counts: HashMap::new(),
            total_nanos: 0,
            fastest: None,
            slowest: None,
            response_times: Vec::with_capacity(usize::try_from(total_requests).unwrap_or(0)),
        }
    }

    pub fn recorded(&self) -> u64 {
        self.recorded
    }

    pub fn record(&mut self, outcome: Outcome) {
        self.recorded += 1;

        let (status, duration) = match outcome {
            Outcome::Failed { error, .. } => {
                self.failed_requests += 1;
                *self.error_counts.entry(error.kind()).or_insert(0) += 1;
                return;
            }
            Outcome::Response { status, duration } => (status, duration),
        };

        *self.status_code_counts.entry(status).or_insert(0) += 1;
        if status == HTTP_OK {
            self.successful_requests += 1;
        }

        self.total_nanos += duration.as_nanos();
        if self.fastest.map_or(true, |fastest| duration < fastest) {
            self.fastest = Some(duration);
        }
        if self.slowest.map_or(true, |slowest| duration > slowest) {
            self.slowest = Some(duration);
        }
        self.response_times.push(duration);
    }

    pub fn finish(mut self, total_duration: Duration) -> Report {
        let samples = self.response_times.len() as u128;
        let average_duration = if samples > 0 {
            Some(nanos_to_duration(self.total_nanos / samples))
        } else {
            None
        };
        let median_duration = calculate_median(&mut self.response_times);

        Report {
            total_requests: self.total_requests,
            concurrency: self.concurrency,
            total_duration,
            successful_requests: self.successful_requests,
            failed_requests: self.failed_requests,
            status_code_counts: self.status_code_counts,
            error_counts: self.error_counts,
            average_duration,
            min_duration: self.fastest,
            max_duration: self.slowest,
            median_duration,
            timestamp: Local::now().format("%Y/%m/%d %H:%M:%S").to_string(),
        }
    }
}

fn calculate_median(data: &mut [Duration]) -> Option<Duration> {
    data.sort_unstable();
    let len = data.len();
    if len == 0 {
        return None;
    }
    if len % 2 == 0 {
        let low = data[len / 2 - 1].as_nanos();
        let high = data[len / 2].as_nanos();
        Some(nanos_to_duration((low + high) / 2))
    } else {
        Some(data[len / 2])
    }
}

fn nanos_to_duration(nanos: u128) -> Duration {
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

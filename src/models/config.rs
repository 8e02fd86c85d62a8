use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const DEFAULT_REQUESTS: u64 = 100;
pub const DEFAULT_CONCURRENCY: u64 = 10;
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Invalid run parameters. Always detected before any request is dispatched.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("URL is required")]
    MissingUrl,

    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported URL '{0}': only http and https targets with a host are supported")]
    UnsupportedScheme(String),

    #[error("Number of requests must be greater than 0")]
    InvalidRequests,

    #[error("Concurrency must be greater than 0 and less than or equal to the number of requests (got concurrency {concurrency}, requests {requests})")]
    InvalidConcurrency { concurrency: u64, requests: u64 },

    #[error("Request timeout must be greater than 0 ms")]
    InvalidTimeout,

    #[error("failed to read run file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse run file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Validated parameters of one run. Construct through [`RunConfig::new`] or
/// [`RunSettings::resolve`]; every instance satisfies
/// `0 < concurrency <= total_requests`.
#[derive(Debug, Clone)]
pub struct RunConfig {
    url: String,
    total_requests: u64,
    concurrency: u64,
    timeout: Duration,
}

impl RunConfig {
    pub fn new(
        url: impl Into<String>,
        total_requests: u64,
        concurrency: u64,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(ConfigError::MissingUrl);
        }
        let parsed = Url::parse(&url).map_err(|source| ConfigError::InvalidUrl {
            url: url.clone(),
            source,
        })?;
        if !matches!(parsed.scheme(), "http" | "https") || !parsed.has_host() {
            return Err(ConfigError::UnsupportedScheme(url));
        }

        if total_requests == 0 {
            return Err(ConfigError::InvalidRequests);
        }
        if concurrency == 0 || concurrency > total_requests {
            return Err(ConfigError::InvalidConcurrency {
                concurrency,
                requests: total_requests,
            });
        }
        if timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }

        Ok(Self {
            url: parsed.to_string(),
            total_requests,
            concurrency,
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }

    pub fn concurrency(&self) -> u64 {
        self.concurrency
    }

    /// Per-request timeout applied by the HTTP worker.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Unvalidated run parameters, as read from a JSON run file or the command line.
///
/// Unknown fields are ignored, so a full load-test DSL document (with `name`,
/// `method`, ...) can be reused as a run file.
#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RunSettings {
    pub target: Option<String>,
    pub requests: Option<u64>,
    pub concurrency: Option<u64>,
    /// Milliseconds.
    pub timeout: Option<u64>,
}

impl RunSettings {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Values set in `overrides` win over values in `self`.
    pub fn merge(self, overrides: RunSettings) -> RunSettings {
        RunSettings {
            target: overrides.target.or(self.target),
            requests: overrides.requests.or(self.requests),
            concurrency: overrides.concurrency.or(self.concurrency),
            timeout: overrides.timeout.or(self.timeout),
        }
    }

    pub fn resolve(self) -> Result<RunConfig, ConfigError> {
        let url = self.target.ok_or(ConfigError::MissingUrl)?;
        RunConfig::new(
            url,
            self.requests.unwrap_or(DEFAULT_REQUESTS),
            self.concurrency.unwrap_or(DEFAULT_CONCURRENCY),
            Duration::from_millis(self.timeout.unwrap_or(DEFAULT_TIMEOUT_MS)),
        )
    }
}

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;

use loadforge::utils::hardware::get_hardware_info;
use loadforge::{print_banner, print_report, run_load_test, HttpRequester, RunConfig, RunSettings};

#[derive(Parser, Debug)]
#[command(name = "loadforge", version, about = "Fire a fixed number of HTTP GET requests at a target under a concurrency limit")]
struct Cli {
    /// URL of the service to test
    #[arg(short = 'u', long)]
    url: Option<String>,

    /// Total number of requests [default: 100]
    #[arg(short = 'n', long)]
    requests: Option<u64>,

    /// Number of concurrent requests [default: 10]
    #[arg(short = 'c', long)]
    concurrency: Option<u64>,

    /// Per-request timeout in milliseconds [default: 5000]
    #[arg(short = 't', long)]
    timeout: Option<u64>,

    /// JSON run file; command-line flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log every request at debug level
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl Cli {
    fn settings(&self) -> RunSettings {
        RunSettings {
            target: self.url.clone(),
            requests: self.requests,
            concurrency: self.concurrency,
            timeout: self.timeout,
        }
    }
}

fn load_config(cli: &Cli) -> Result<RunConfig> {
    let base = match &cli.config {
        Some(path) => RunSettings::from_file(path)
            .with_context(|| format!("loading run file {}", path.display()))?,
        None => RunSettings::default(),
    };
    let config = base.merge(cli.settings()).resolve()?;
    Ok(config)
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "loadforge=debug" } else { "loadforge=info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run<I, T>(args: I) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    init_tracing(cli.verbose);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            eprintln!("Run with --help for usage.");
            return ExitCode::FAILURE;
        }
    };

    print_banner(&config, &get_hardware_info());

    let requester = Arc::new(HttpRequester::new(config.timeout()));
    let report = run_load_test(requester, &config).await;
    print_report(&report);

    ExitCode::SUCCESS
}

#[tokio::main]
async fn main() -> ExitCode {
    run(std::env::args_os()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_flags_resolve_with_defaults() {
        let cli = Cli::try_parse_from(["loadforge", "--url", "http://localhost:3000"]).unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.total_requests(), 100);
        assert_eq!(config.concurrency(), 10);
        assert_eq!(config.timeout(), Duration::from_millis(5000));
    }

    #[test]
    fn test_missing_url_is_rejected() {
        let cli = Cli::try_parse_from(["loadforge", "-n", "5"]).unwrap();
        let err = load_config(&cli).unwrap_err();
        assert_eq!(err.to_string(), "URL is required");
    }

    #[test]
    fn test_concurrency_above_requests_is_rejected() {
        let cli = Cli::try_parse_from([
            "loadforge",
            "-u",
            "http://localhost:3000",
            "-n",
            "5",
            "-c",
            "6",
        ])
        .unwrap();
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn test_negative_requests_fail_to_parse() {
        assert!(Cli::try_parse_from(["loadforge", "-u", "http://x", "-n", "-1"]).is_err());
    }

    #[tokio::test]
    async fn test_unparseable_flag_exits_with_failure() {
        let code = run(["loadforge", "-u", "http://localhost:3000", "--requests", "lots"]).await;
        assert_eq!(code, ExitCode::FAILURE);
    }

    #[tokio::test]
    async fn test_invalid_config_exits_with_failure() {
        assert_eq!(run(["loadforge", "-n", "5"]).await, ExitCode::FAILURE);
        assert_eq!(
            run(["loadforge", "-u", "http://localhost:3000", "-n", "5", "-c", "0"]).await,
            ExitCode::FAILURE
        );
        assert_eq!(
            run(["loadforge", "--config", "/nonexistent/loadforge-run.json"]).await,
            ExitCode::FAILURE
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_failed_requests_still_exit_successfully() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let url = format!("http://{addr}/");

        let code = run(["loadforge", "-u", url.as_str(), "-n", "3", "-c", "2", "-t", "1000"]).await;
        assert_eq!(code, ExitCode::SUCCESS);
    }
}

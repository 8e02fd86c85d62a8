use std::fmt::Write as _;
use std::time::Duration;

use colored::*;

use crate::models::config::RunConfig;
use crate::models::metrics::Report;
use crate::utils::hardware::HostInfo;

pub fn print_banner(config: &RunConfig, host: &HostInfo) {
    println!("{} {}", "Starting load test for".bold(), config.url().bold().cyan());
    println!("{} {}", "Total requests    :".blue().bold(), config.total_requests());
    println!("{} {}", "Concurrency level :".blue().bold(), config.concurrency());
    println!(
        "{} {}",
        "Request timeout   :".blue().bold(),
        format!("{}ms", config.timeout().as_millis())
    );
    println!(
        "{} {} cores, {} MiB available / {} MiB total",
        "Load generator    :".blue().bold(),
        host.cpu_cores,
        host.available_memory_mib(),
        host.total_memory_mib()
    );
    println!();
}

pub fn print_report(report: &Report) {
    print!("{}", render_report(report));
}

pub fn render_report(report: &Report) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", "======== LOAD TEST REPORT ========".bold().white().on_blue());
    let _ = writeln!(out, "{} {}", "Timestamp                : ".blue().bold(), report.timestamp);
    let _ = writeln!(
        out,
        "{} {}",
        "Total time               : ".blue().bold(),
        format!("{:.2?}", report.total_duration).bold()
    );
    let _ = writeln!(
        out,
        "{} {}",
        "Total requests           : ".green().bold(),
        report.total_requests.to_string().bold()
    );
    let _ = writeln!(
        out,
        "{} {}",
        "Successful requests (200): ".green().bold(),
        report.successful_requests.to_string().bold()
    );
    let _ = writeln!(
        out,
        "{} {}",
        "Failed requests          : ".red().bold(),
        report.failed_requests.to_string().bold()
    );
    let _ = writeln!(
        out,
        "{} {}",
        "Requests per second (RPS): ".magenta().bold(),
        format!("{:.2}", report.requests_per_second()).bold()
    );
    let _ = writeln!(
        out,
        "{} {}",
        "Average response time    : ".cyan().bold(),
        format_latency(report.average_duration).bold()
    );
    let _ = writeln!(
        out,
        "{} {}",
        "Min response time        : ".cyan().bold(),
        format_latency(report.min_duration).bold()
    );
    let _ = writeln!(
        out,
        "{} {}",
        "Max response time        : ".yellow().bold(),
        format_latency(report.max_duration).bold()
    );
    let _ = writeln!(
        out,
        "{} {}",
        "Median response time     : ".yellow().bold(),
        format_latency(report.median_duration).bold()
    );

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", "======== STATUS CODE DISTRIBUTION ========".bold().white().on_blue());
    for (code, count) in &report.status_code_counts {
        let _ = writeln!(out, "  [{}]: {} responses", code, count);
    }

    if !report.error_counts.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", "======== ERROR BREAKDOWN ========".bold().white().on_red());
        for (kind, count) in &report.error_counts {
            let _ = writeln!(out, "  {}: {} requests", kind.red(), count);
        }
    }

    out
}

fn format_latency(value: Option<Duration>) -> String {
    match value {
        Some(duration) => format!("{:.2?}", duration),
        None => "n/a (no responses received)".to_string(),
    }
}

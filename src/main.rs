use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use ecosystem_autotests::config::{self, Config};
use ecosystem_autotests::driver::{MockSite, service};
use ecosystem_autotests::harness::{TestBase, catalogue, run_suite, select};
use ecosystem_autotests::logging;
use ecosystem_autotests::report::{cleanup_old_reports, list_reports, resolve_reports_dir};

/// Ecosystem Autotests - end-to-end tests for the AI Ecosystem web application
#[derive(Parser, Debug)]
#[command(
    name = "ecosystem-autotests",
    about = "Browser-driven end-to-end tests with a streaming session report",
    after_help = "ENVIRONMENT VARIABLES:\n\
        ECOSYSTEM_LOGIN / ECOSYSTEM_PASSWORD   Account credentials\n\
        ECOSYSTEM_LOGIN_URL / ECOSYSTEM_MODEL_URL   Target pages\n\
        ECOSYSTEM_WEBDRIVER_URL   Use a running WebDriver server\n\
        ECOSYSTEM_CHROMEDRIVER    chromedriver binary to spawn\n\
        ECOSYSTEM_REPORTS_DIR     Aggregate report directory\n\
        ECOSYSTEM_LOG             Diagnostic log filter"
)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the built-in scenario suite
    Run {
        /// Only run scenarios whose name contains this text
        #[arg(short, long)]
        filter: Option<String>,

        /// Run Chrome without a window (also ECOSYSTEM_HEADLESS=on)
        #[arg(long)]
        headless: bool,

        /// Run against the in-process mock of the site instead of Chrome
        #[arg(long)]
        mock: bool,

        /// Number of scenarios to run at once
        #[arg(short, long, default_value = "1")]
        parallel: usize,

        /// Output the suite result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the built-in scenarios
    List,

    /// Check that a WebDriver server is ready
    Status {
        /// WebDriver server URL
        #[arg(long, env = "ECOSYSTEM_WEBDRIVER_URL", default_value = "http://localhost:9515")]
        url: String,
    },

    /// List aggregate report files
    Reports {
        /// Reports directory (default: resolved like the test run does)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Delete reports older than this many days first
        #[arg(long)]
        cleanup_days: Option<u64>,
    },
}

/// Report age cut-off for `--cleanup-days`; huge values keep everything
fn cleanup_age(days: u64) -> Duration {
    Duration::from_secs(days.saturating_mul(24 * 60 * 60))
}

fn main() -> Result<(), Box<dyn Error>> {
    logging::init();
    let args = Args::parse();

    match args.command {
        Some(Commands::Run {
            filter,
            headless,
            mock,
            parallel,
            json,
        }) => {
            let scenarios = select(filter.as_deref());
            if scenarios.is_empty() {
                return Err(format!("no scenario matches '{}'", filter.unwrap_or_default()).into());
            }

            let config = Config::from_env().with_headless(headless || config::headless());
            let mut base = TestBase::new(config.clone());
            if mock {
                base = base.with_factory(MockSite::new(&config.site).into_factory());
            }
            // Keep stdout clean for the JSON document; the global aggregator
            // stays in place so the exit hooks finalize the file in use
            base.aggregator().set_console(!json);

            let result = run_suite(&base, &scenarios, parallel);
            base.aggregator().finalize_session();

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                for test in &result.tests {
                    let seconds = test.duration_ms as f64 / 1000.0;
                    if test.passed() {
                        println!("✅ {} ({:.1} s)", test.name, seconds);
                    } else {
                        println!("❌ {} ({:.1} s): {}", test.name, seconds, test.message);
                        if let Some(shot) = &test.screenshot {
                            println!("    Screenshot: {}", shot.display());
                        }
                    }
                }
                println!();
                println!(
                    "Total: {}, passed: {}, failed: {} in {:.1} s",
                    result.total,
                    result.passed,
                    result.failed,
                    result.duration_ms as f64 / 1000.0
                );
                if let Some(path) = &result.report_path {
                    println!("Report: {}", path.display());
                }
            }

            if !result.success {
                std::process::exit(1);
            }
        }

        Some(Commands::List) => {
            for scenario in catalogue() {
                println!("{:<28} {}", scenario.name, scenario.description);
            }
        }

        Some(Commands::Status { url }) => {
            if service::check_status(&url, Duration::from_secs(5))? {
                println!("WebDriver at {} is ready", url);
            } else {
                println!("WebDriver at {} responded but is not ready", url);
                std::process::exit(1);
            }
        }

        Some(Commands::Reports { dir, cleanup_days }) => {
            let dir = dir.unwrap_or_else(|| resolve_reports_dir(config::get().reports.reports_dir.as_deref()));

            if let Some(days) = cleanup_days {
                let removed = cleanup_old_reports(&dir, cleanup_age(days))?;
                println!("Removed {} report(s) older than {} day(s)", removed, days);
            }

            let reports = list_reports(&dir)?;
            if reports.is_empty() {
                println!("No reports in {}", dir.display());
            }
            for report in reports {
                let modified = report
                    .modified
                    .map(|m| m.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{}  {:>9} bytes  {}", modified, report.size, report.path.display());
            }
        }

        None => {
            println!("Ecosystem Autotests - end-to-end tests for the AI Ecosystem web application");
            println!();
            println!("Usage: ecosystem-autotests <COMMAND>");
            println!();
            println!("Commands:");
            println!("  run      Run the built-in scenario suite");
            println!("  list     List the built-in scenarios");
            println!("  status   Check that a WebDriver server is ready");
            println!("  reports  List aggregate report files");
            println!();
            println!("Run with --help for more information.");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_age() {
        assert_eq!(cleanup_age(0), Duration::ZERO);
        assert_eq!(cleanup_age(7), Duration::from_secs(7 * 86_400));
        assert_eq!(cleanup_age(u64::MAX), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_reports_accepts_large_cleanup_days() {
        let args = Args::try_parse_from(["ecosystem-autotests", "reports", "--cleanup-days", "18446744073709551615"]).unwrap();
        assert!(matches!(args.command, Some(Commands::Reports { cleanup_days: Some(u64::MAX), .. })));
    }
}

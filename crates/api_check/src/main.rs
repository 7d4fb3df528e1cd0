//! # Telemetria API Check
//!
//! Roda a suíte de aceitação contra um servidor de ingestão em execução.
//! Sai com código 1 se alguma verificação falhar.
//!
//! ## Uso
//! ```bash
//! telemetry_check                               # http://localhost:7187
//! telemetry_check --url http://10.0.0.5:7187
//! ```

use clap::Parser;
use std::process::ExitCode;
use telemetry_core::acceptance::{AcceptanceSuite, SuiteReport};
use telemetry_core::config::{AppConfig, secs};
use telemetry_core::{ApiClient, Profile, TelemetryGenerator};
use tracing::error;

#[derive(Debug, Parser)]
#[command(name = "telemetry_check", version, about = "Racing telemetry API acceptance checks")]
struct Args {
    /// URL base da API (sobrescreve config.toml)
    #[arg(long)]
    url: Option<String>,

    /// Caminho do config.toml
    #[arg(long)]
    config: Option<std::path::PathBuf>,
}

fn main() -> ExitCode {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let config_path = args.config.clone().unwrap_or_else(AppConfig::default_path);
    let mut config = AppConfig::load(&config_path);
    if let Some(url) = args.url {
        config.api.base_url = url;
    }
    let config = match config.validated() {
        Ok(c) => c,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let clients = ApiClient::new(&config.api.base_url, secs(config.check.timeout_secs)).and_then(
        |c| {
            ApiClient::new(&config.api.base_url, secs(config.check.performance_timeout_secs))
                .map(|p| (c, p))
        },
    );
    let (client, perf_client) = match clients {
        Ok(pair) => pair,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    println!("🏁 Racing Telemetry API checks → {}", client.base_url());
    println!("{}", "=".repeat(50));

    let generator = TelemetryGenerator::new(Profile::Sample, config.api.device_id.clone());
    let report = AcceptanceSuite::new(client, perf_client, generator)
        .with_min_requests_per_sec(config.check.min_requests_per_sec)
        .run_all();

    println!("{}", "=".repeat(50));
    print!("{}", summary(&report));

    if report.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn summary(report: &SuiteReport) -> String {
    let mut out = String::new();
    for o in &report.outcomes {
        let mark = if o.passed { "✅" } else { "❌" };
        out.push_str(&format!("{mark} {:<18} {}\n", o.name, o.detail));
    }
    let passed = report.outcomes.iter().filter(|o| o.passed).count();
    out.push_str(&format!("🏁 {passed}/{} verificações aprovadas\n", report.outcomes.len()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use telemetry_core::acceptance::CheckOutcome;

    #[test]
    fn summary_counts_passed_checks() {
        let report = SuiteReport {
            outcomes: vec![
                CheckOutcome {
                    name: "send_single",
                    passed: true,
                    detail: "ok".into(),
                },
                CheckOutcome {
                    name: "stats",
                    passed: false,
                    detail: "HTTP 500".into(),
                },
            ],
        };
        let text = summary(&report);
        assert!(text.contains("✅ send_single"));
        assert!(text.contains("❌ stats"));
        assert!(text.ends_with("1/2 verificações aprovadas\n"));
    }
}

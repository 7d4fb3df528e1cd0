//! Suíte de aceitação contra um servidor real.
//!
//! Ignorada por padrão. Para rodar (servidor em `localhost:7187` ou
//! `TELEMETRY_API_URL`):
//! ```bash
//! cargo test -p telemetry_core --test live_api -- --ignored --test-threads=1
//! ```

use std::time::Duration;

use telemetry_core::acceptance::AcceptanceSuite;
use telemetry_core::api::ApiClient;
use telemetry_core::config::{API_URL_ENV, AppConfig};
use telemetry_core::generator::{Profile, TelemetryGenerator};

fn live_suite() -> AcceptanceSuite {
    let mut config = AppConfig::default();
    if let Ok(url) = std::env::var(API_URL_ENV) {
        config.api.base_url = url;
    }
    let client = ApiClient::new(&config.api.base_url, Duration::from_secs(10)).unwrap();
    let perf_client = ApiClient::new(&config.api.base_url, Duration::from_secs(5)).unwrap();
    let generator = TelemetryGenerator::new(Profile::Sample, config.api.device_id);
    AcceptanceSuite::new(client, perf_client, generator)
}

#[test]
#[ignore = "requer servidor de telemetria rodando"]
fn live_server_passes_acceptance_suite() {
    let report = live_suite().run_all();
    for outcome in &report.outcomes {
        println!(
            "{} {}: {}",
            if outcome.passed { "✅" } else { "❌" },
            outcome.name,
            outcome.detail
        );
    }
    assert!(report.all_passed());
}

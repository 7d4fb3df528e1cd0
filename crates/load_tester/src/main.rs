//! # Telemetria Load Tester
//!
//! Dispara N clientes concorrentes contra `POST /api/telemetry` por um tempo
//! fixo e reporta a vazão.
//!
//! ## Uso
//! ```bash
//! telemetry_load                                  # Normal, High Frequency e Stress
//! telemetry_load --scenario stress
//! telemetry_load --clients 10 --duration 60 --interval 0.2
//! ```

use clap::{Parser, ValueEnum};
use std::process::ExitCode;
use std::time::Duration;
use telemetry_core::config::{AppConfig, secs};
use telemetry_core::{ApiClient, LoadReport, LoadScenario, LoadTest};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ScenarioArg {
    All,
    Normal,
    HighFrequency,
    Stress,
}

#[derive(Debug, Parser)]
#[command(name = "telemetry_load", version, about = "Racing telemetry load tester")]
struct Args {
    /// URL base da API (sobrescreve config.toml)
    #[arg(long)]
    url: Option<String>,

    /// Cenário padrão a executar
    #[arg(long, value_enum, default_value = "all")]
    scenario: ScenarioArg,

    /// Cenário customizado: número de clientes
    #[arg(long)]
    clients: Option<usize>,

    /// Cenário customizado: duração em segundos
    #[arg(long, default_value_t = 60.0, requires = "clients")]
    duration: f64,

    /// Cenário customizado: intervalo entre envios por cliente (segundos)
    #[arg(long, default_value_t = 1.0, requires = "clients")]
    interval: f64,

    /// Descanso entre cenários em segundos (sobrescreve config.toml)
    #[arg(long)]
    rest: Option<f64>,

    /// Caminho do config.toml
    #[arg(long)]
    config: Option<std::path::PathBuf>,
}

impl Args {
    fn scenarios(&self) -> Vec<LoadScenario> {
        if let Some(clients) = self.clients {
            return vec![LoadScenario::new(
                "Custom",
                clients,
                secs(self.duration),
                secs(self.interval),
            )];
        }
        match self.scenario {
            ScenarioArg::All => LoadScenario::standard(),
            ScenarioArg::Normal => vec![LoadScenario::normal()],
            ScenarioArg::HighFrequency => vec![LoadScenario::high_frequency()],
            ScenarioArg::Stress => vec![LoadScenario::stress()],
        }
    }
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

    // ── Carregar config ──
    let config_path = args.config.clone().unwrap_or_else(AppConfig::default_path);
    let mut config = AppConfig::load(&config_path);
    if let Some(url) = &args.url {
        config.api.base_url = url.clone();
    }
    if let Some(rest) = args.rest {
        config.load.rest_secs = rest;
    }
    let config = match config.validated() {
        Ok(c) => c,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let client = match ApiClient::new(&config.api.base_url, secs(config.load.timeout_secs)) {
        Ok(c) => c,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let scenarios = args.scenarios();
    if scenarios.iter().any(|s| s.clients == 0) {
        error!("Número de clientes deve ser > 0");
        return ExitCode::FAILURE;
    }

    println!("{}", "=".repeat(50));
    println!("🏎️ Racing Telemetry Load Testing → {}", client.base_url());
    println!("{}", "=".repeat(50));

    let load = LoadTest::new(client, config.api.device_id.clone());
    let rest = secs(config.load.rest_secs);

    for (i, scenario) in scenarios.iter().enumerate() {
        if i > 0 && rest > Duration::ZERO {
            info!("Descansando {:.0}s antes do próximo cenário", rest.as_secs_f64());
            std::thread::sleep(rest);
        }

        println!();
        println!("{}. {}", i + 1, describe_scenario(scenario));
        println!("{}", "-".repeat(40));
        let report = load.run(scenario);
        println!("{}", "-".repeat(40));
        print!("{}", format_report(&report));
    }

    ExitCode::SUCCESS
}

fn describe_scenario(s: &LoadScenario) -> String {
    format!(
        "{} ({} clientes, {:.2}s de intervalo, {:.0}s) – ~{:.0} requisições esperadas",
        s.name,
        s.clients,
        s.interval.as_secs_f64(),
        s.duration.as_secs_f64(),
        s.expected_requests()
    )
}

fn format_report(r: &LoadReport) -> String {
    format!(
        "📊 Resultado – {}\n   \
         - Tempo total: {:.2} s\n   \
         - Requisições: {}\n   \
         - Sucesso: {}\n   \
         - Erros: {}\n   \
         - Taxa de sucesso: {:.1}%\n   \
         - Requisições/s: {:.2}\n   \
         - Sucessos/s: {:.2}\n",
        r.scenario,
        r.total_time.as_secs_f64(),
        r.total_requests(),
        r.success,
        r.errors,
        r.success_rate(),
        r.requests_per_second(),
        r.successful_per_second()
    )
}

//! # Telemetria Sender
//!
//! Gera um registro aleatório de telemetria e envia para a API de ingestão
//! a cada intervalo.
//!
//! ## Uso
//! ```bash
//! telemetry_sender                                   # config.toml / padrão
//! telemetry_sender --url http://10.0.0.5:7187 --interval 0.5
//! telemetry_sender --count 100                       # para após 100 envios
//! ```

use chrono::Local;
use clap::Parser;
use std::process::ExitCode;
use std::time::Instant;
use telemetry_core::config::{AppConfig, secs};
use telemetry_core::indicators::{IndicatorLevel, evaluate_indicators};
use telemetry_core::{ApiClient, Profile, TelemetryGenerator};
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "telemetry_sender", version, about = "Racing telemetry periodic sender")]
struct Args {
    /// URL base da API (sobrescreve config.toml)
    #[arg(long)]
    url: Option<String>,

    /// Intervalo entre envios em segundos
    #[arg(long)]
    interval: Option<f64>,

    /// Para após N envios (0 = infinito)
    #[arg(long)]
    count: Option<u64>,

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

    // ── Carregar config ──
    let config_path = args.config.clone().unwrap_or_else(AppConfig::default_path);
    let mut config = AppConfig::load(&config_path);

    // Salva config padrão se não existir
    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!("Não foi possível salvar config padrão: {e}");
        }
    }

    if let Some(url) = args.url {
        config.api.base_url = url;
    }
    if let Some(interval) = args.interval {
        config.sender.interval_secs = interval;
    }
    if let Some(count) = args.count {
        config.sender.count = count;
    }

    let config = match config.validated() {
        Ok(c) => c,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let client = match ApiClient::new(&config.api.base_url, secs(config.sender.timeout_secs)) {
        Ok(c) => c,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let interval = secs(config.sender.interval_secs);
    let mut generator = TelemetryGenerator::new(Profile::Random, config.api.device_id.clone());

    // ── Banner ──
    println!();
    println!("══════════════════════════════════════════════");
    println!("   🏎️ RACING TELEMETRY SENDER – ATIVO");
    println!("══════════════════════════════════════════════");
    println!("  Destino:   {}", client.url(telemetry_core::api::TELEMETRY_PATH));
    println!("  Intervalo: {:.1}s", config.sender.interval_secs);
    println!("  Device:    {}", config.api.device_id);
    println!("══════════════════════════════════════════════");
    println!();

    // ── Loop principal ──
    let mut counter: u64 = 0;
    let mut delivered: u64 = 0;
    loop {
        let cycle_start = Instant::now();
        counter += 1;

        let record = generator.next_record();
        let clock = Local::now().format("%H:%M:%S");
        match client.send_telemetry(&record) {
            Ok(outcome) if outcome.is_success() => {
                delivered += 1;
                info!(
                    "[{counter}] {clock} ✅ Enviado – RPM: {}, Temp: {:.1}°C",
                    record.sensors.rpm, record.sensors.temperature
                );
            }
            Ok(outcome) => {
                warn!("[{counter}] {clock} ❌ Falha no envio – Status: {}", outcome.status);
            }
            Err(e) => error!("[{counter}] {clock} ❌ Erro: {e}"),
        }

        for indicator in evaluate_indicators(&record) {
            if indicator.level >= IndicatorLevel::Warning {
                warn!("⚠ {:?} {:?}: {}", indicator.card, indicator.level, indicator.message);
            }
        }

        if config.sender.count > 0 && counter >= config.sender.count {
            break;
        }

        // Dormir pelo tempo restante do intervalo
        let elapsed = cycle_start.elapsed();
        if elapsed < interval {
            std::thread::sleep(interval - elapsed);
        }
    }

    info!("🛑 Parado após {counter} envios ({delivered} aceitos)");
    ExitCode::SUCCESS
}

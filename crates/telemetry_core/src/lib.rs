//! # Telemetry Core
//!
//! Crate compartilhada pelas ferramentas de cliente da API de telemetria de
//! corrida: modelo de dados, gerador de registros sintéticos, cliente HTTP,
//! gerador de carga e suíte de aceitação.
//!
//! ## Módulos
//! - [`types`] – `TelemetryRecord` e respostas da API
//! - [`generator`] – Registros aleatórios por perfil, contador de voltas
//! - [`api`] – Cliente HTTP (`/api/telemetry`, `/api/history`, `/api/stats`)
//! - [`load`] – Workers concorrentes com contadores compartilhados
//! - [`acceptance`] – Verificações de ponta a ponta contra o servidor
//! - [`indicators`] – Níveis dos cards do painel
//! - [`config`] – Configuração unificada via TOML

pub mod acceptance;
pub mod api;
pub mod config;
pub mod generator;
pub mod indicators;
pub mod load;
pub mod types;

// Re-exports convenientes
pub use api::{ApiClient, ApiError, SendOutcome};
pub use config::AppConfig;
pub use generator::{Profile, TelemetryGenerator};
pub use load::{LoadReport, LoadScenario, LoadTest};
pub use types::TelemetryRecord;

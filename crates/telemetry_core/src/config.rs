//! Configuração unificada via TOML.
//!
//! Um único `config.toml` ao lado do executável alimenta os três binários
//! (sender, load tester e api check). Seções ausentes usam o padrão.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::generator::DEFAULT_DEVICE_ID;

/// Variável de ambiente que sobrescreve `api.base_url`.
pub const API_URL_ENV: &str = "TELEMETRY_API_URL";

/// Erros ao salvar/validar configuração.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Erro ao serializar configuração: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Erro ao gravar {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuração inválida: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Servidor alvo.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// URL base da API (sem `/api/...`)
    pub base_url: String,
    /// `device_id` dos registros gerados
    pub device_id: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:7187".into(),
            device_id: DEFAULT_DEVICE_ID.into(),
        }
    }
}

/// Sender periódico.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    /// Intervalo de envio em segundos
    pub interval_secs: f64,
    /// Timeout por requisição (segundos)
    pub timeout_secs: f64,
    /// Para após N envios (0 = infinito)
    pub count: u64,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            interval_secs: 1.0,
            timeout_secs: 5.0,
            count: 0,
        }
    }
}

/// Gerador de carga.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Descanso entre cenários (segundos)
    pub rest_secs: f64,
    /// Timeout por requisição (segundos)
    pub timeout_secs: f64,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            rest_secs: 5.0,
            timeout_secs: 5.0,
        }
    }
}

/// Suíte de aceitação.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Timeout das requisições comuns (segundos)
    pub timeout_secs: f64,
    /// Timeout do teste de performance (segundos)
    pub performance_timeout_secs: f64,
    /// Mínimo de requisições por segundo no teste de performance
    pub min_requests_per_sec: f64,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10.0,
            performance_timeout_secs: 5.0,
            min_requests_per_sec: 5.0,
        }
    }
}

/// Configuração raiz.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub sender: SenderConfig,
    pub load: LoadConfig,
    pub check: CheckConfig,
}

impl AppConfig {
    /// Carrega configuração de um arquivo TOML e aplica `TELEMETRY_API_URL`.
    ///
    /// Arquivo ausente ou inválido não é fatal: cai no padrão com um aviso.
    pub fn load(path: &Path) -> Self {
        let mut config = Self::load_file(path);
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                info!("{API_URL_ENV} definido, usando {url}");
                config.api.base_url = url;
            }
        }
        config
    }

    fn load_file(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str::<AppConfig>(&content) {
                    Ok(config) => {
                        info!("Configuração carregada de {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        warn!("Erro ao parsear {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    warn!("Erro ao ler {}: {}", path.display(), e);
                }
            }
        }

        info!("Usando configuração padrão");
        AppConfig::default()
    }

    /// Salva configuração em arquivo TOML.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Configuração salva em {}", path.display());
        Ok(())
    }

    /// Retorna o caminho padrão do config.toml.
    pub fn default_path() -> PathBuf {
        let exe_dir = std::env::current_exe()
            .map(|p| p.parent().unwrap_or(Path::new(".")).to_path_buf())
            .unwrap_or_else(|_| PathBuf::from("."));
        exe_dir.join("config.toml")
    }

    /// Valida a configuração e retorna lista de erros.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let url = self.api.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(format!("URL da API inválida: {:?} (esperado http:// ou https://)", url));
        }
        if self.api.device_id.trim().is_empty() {
            errors.push("device_id não pode ser vazio".into());
        }
        if self.sender.interval_secs < 0.0 || self.sender.interval_secs > 3600.0 {
            errors.push(format!(
                "Intervalo do sender inválido: {} (0–3600)",
                self.sender.interval_secs
            ));
        }
        for (name, secs) in [
            ("sender.timeout_secs", self.sender.timeout_secs),
            ("load.timeout_secs", self.load.timeout_secs),
            ("check.timeout_secs", self.check.timeout_secs),
            ("check.performance_timeout_secs", self.check.performance_timeout_secs),
        ] {
            if !(secs > 0.0 && secs.is_finite()) {
                errors.push(format!("{name} deve ser > 0 (obtido {secs})"));
            }
        }
        if self.load.rest_secs < 0.0 || !self.load.rest_secs.is_finite() {
            errors.push(format!("load.rest_secs inválido: {}", self.load.rest_secs));
        }

        errors
    }

    /// Como [`validate`](Self::validate), mas em forma de `Result`.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }
}

/// Converte segundos (f64 do TOML) em [`Duration`], saturando negativos em zero.
pub fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.max(0.0)).unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        let errors = config.validate();
        assert!(errors.is_empty(), "Erros: {:?}", errors);
    }

    #[test]
    fn roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.api.base_url, parsed.api.base_url);
        assert_eq!(config.load.rest_secs, parsed.load.rest_secs);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let partial = r#"
[api]
base_url = "http://10.0.0.5:3000"
"#;
        let config: AppConfig = toml::from_str(partial).unwrap();
        assert_eq!(config.api.base_url, "http://10.0.0.5:3000");
        // Outros campos devem ter valor padrão
        assert_eq!(config.api.device_id, DEFAULT_DEVICE_ID);
        assert_eq!(config.sender.interval_secs, 1.0);
        assert_eq!(config.check.timeout_secs, 10.0);
    }

    #[test]
    fn timeouts_live_in_each_binary_section() {
        let text = r#"
[sender]
timeout_secs = 1.5

[load]
timeout_secs = 2.5

[check]
timeout_secs = 3.5
performance_timeout_secs = 4.5
min_requests_per_sec = 8.0
"#;
        let config: AppConfig = toml::from_str(text).unwrap();
        assert_eq!(config.sender.timeout_secs, 1.5);
        assert_eq!(config.load.timeout_secs, 2.5);
        assert_eq!(config.check.timeout_secs, 3.5);
        assert_eq!(config.check.performance_timeout_secs, 4.5);
        assert_eq!(config.check.min_requests_per_sec, 8.0);

        let saved = toml::to_string_pretty(&AppConfig::default()).unwrap();
        let api = saved.split("[sender]").next().unwrap_or_default();
        assert!(!api.contains("timeout_secs"), "{saved}");
    }

    #[test]
    fn invalid_values_are_reported() {
        let mut config = AppConfig::default();
        config.api.base_url = "localhost:7187".into();
        config.load.timeout_secs = 0.0;
        let errors = config.validate();
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(matches!(config.validated(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn secs_saturates_negative() {
        assert_eq!(secs(-1.0), Duration::ZERO);
        assert_eq!(secs(0.5), Duration::from_millis(500));
    }

    #[test]
    fn save_then_load_from_disk() {
        let path = std::env::temp_dir().join(format!("telemetry-config-{}.toml", std::process::id()));
        let mut config = AppConfig::default();
        config.sender.count = 42;
        config.save(&path).unwrap();
        let loaded = AppConfig::load_file(&path);
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded.sender.count, 42);
    }
}

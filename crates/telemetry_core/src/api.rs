//! Cliente HTTP da API de ingestão.
//!
//! Endpoints consumidos:
//!
//! ```text
//! POST /api/telemetry        ← TelemetryRecord (JSON)
//! GET  /api/history?limit=N  → [HistoryEntry]
//! GET  /api/stats            → ApiStats
//! ```
//!
//! O cliente é bloqueante: cada thread de worker mantém o seu próprio
//! [`ApiClient`] (barato de clonar, o pool de conexões é compartilhado).

use std::time::{Duration, Instant};

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::types::{ApiStats, HistoryEntry, TelemetryAck, TelemetryRecord};

pub const TELEMETRY_PATH: &str = "/api/telemetry";
pub const HISTORY_PATH: &str = "/api/history";
pub const STATS_PATH: &str = "/api/stats";

/// Erros do cliente HTTP.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Falha ao criar cliente HTTP: {0}")]
    Build(#[source] reqwest::Error),

    #[error("Erro de conexão com {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} em {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Resposta inválida de {url}: {reason}")]
    Decode { url: String, reason: String },
}

impl ApiError {
    /// `true` para falhas de rede (servidor fora do ar, timeout…).
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport { .. })
    }
}

/// Resultado de um `POST /api/telemetry`.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub status: u16,
    pub elapsed: Duration,
    /// Corpo decodificado, se o servidor respondeu JSON no formato esperado.
    pub ack: Option<TelemetryAck>,
}

impl SendOutcome {
    /// O servidor responde exatamente 200 em caso de sucesso.
    pub fn is_success(&self) -> bool {
        self.status == StatusCode::OK.as_u16()
    }

    pub fn is_2xx(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Cliente da API de telemetria.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("telemetry-tools/", env!("CARGO_PKG_VERSION"))),
        );
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(ApiError::Build)?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Envia um registro. Qualquer status HTTP é devolvido em [`SendOutcome`];
    /// só falhas de rede viram `Err`.
    pub fn send_telemetry(&self, record: &TelemetryRecord) -> Result<SendOutcome, ApiError> {
        let url = self.url(TELEMETRY_PATH);
        let started = Instant::now();
        let resp = self
            .client
            .post(&url)
            .json(record)
            .send()
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = resp.status().as_u16();
        let ack = resp.json::<TelemetryAck>().ok();
        let elapsed = started.elapsed();
        debug!("POST {url} → {status} em {elapsed:?}");

        Ok(SendOutcome {
            status,
            elapsed,
            ack,
        })
    }

    /// Envia um corpo JSON arbitrário (inclusive malformado) e devolve o status.
    pub fn send_raw(&self, body: &Value) -> Result<u16, ApiError> {
        let url = self.url(TELEMETRY_PATH);
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;
        Ok(resp.status().as_u16())
    }

    /// `GET /api/history?limit=N`.
    pub fn history(&self, limit: usize) -> Result<Vec<HistoryEntry>, ApiError> {
        let url = format!("{}?limit={limit}", self.url(HISTORY_PATH));
        self.get_json(&url)
    }

    /// `GET /api/stats`.
    pub fn stats(&self) -> Result<ApiStats, ApiError> {
        let url = self.url(STATS_PATH);
        self.get_json(&url)
    }

    /// `GET /` – devolve o status da raiz (200 ou 404 indicam servidor no ar).
    pub fn ping(&self) -> Result<u16, ApiError> {
        let url = self.url("/");
        let resp = self.client.get(&url).send().map_err(|source| ApiError::Transport {
            url: url.clone(),
            source,
        })?;
        Ok(resp.status().as_u16())
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let resp = self.client.get(url).send().map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;
        decode_json(url, resp)
    }
}

fn decode_json<T: DeserializeOwned>(url: &str, resp: Response) -> Result<T, ApiError> {
    let status = resp.status();
    let body = resp.text().map_err(|source| ApiError::Transport {
        url: url.to_string(),
        source,
    })?;

    if !status.is_success() {
        return Err(ApiError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|e| ApiError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

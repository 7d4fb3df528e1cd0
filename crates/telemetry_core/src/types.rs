//! Definição de tipos/structs para telemetria.
//!
//! O JSON gerado pelo serde segue exatamente os nomes de campo esperados
//! pelo endpoint `POST /api/telemetry`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ──────────────────────────────────────────────
// Enums
// ──────────────────────────────────────────────

/// Estado do sistema de aquisição no carro.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SystemStatus {
    #[default]
    Idle,
    Recording,
    Transmitting,
}

impl SystemStatus {
    pub const ALL: [SystemStatus; 3] = [
        SystemStatus::Idle,
        SystemStatus::Recording,
        SystemStatus::Transmitting,
    ];
}

/// Classificação textual do modelo embarcado.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassificationText {
    #[default]
    Normal,
    Warning,
    Critical,
}

impl ClassificationText {
    /// Converte o código numérico (0, 1, 2). Códigos fora da faixa viram `Critical`.
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => ClassificationText::Normal,
            1 => ClassificationText::Warning,
            _ => ClassificationText::Critical,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            ClassificationText::Normal => 0,
            ClassificationText::Warning => 1,
            ClassificationText::Critical => 2,
        }
    }
}

// ──────────────────────────────────────────────
// Seções do registro
// ──────────────────────────────────────────────

/// Leituras dos sensores do motor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Sensors {
    /// Air/Fuel Ratio
    pub afr: f64,
    pub rpm: u32,
    /// Temperatura do motor (°C)
    pub temperature: f64,
    /// Throttle position (0–100%)
    pub tps: f64,
    /// Pressão do coletor (kPa)
    pub map_value: f64,
    /// Inclinação (graus)
    pub incline: f64,
    /// Curso da suspensão (cm)
    pub stroke: f64,
}

/// Posição e velocidade do GPS.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Gps {
    pub latitude: f64,
    pub longitude: f64,
    /// km/h
    pub speed: u32,
    pub satellites: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AiClassification {
    /// 0 = Normal, 1 = Warning, 2 = Critical
    pub classification: u8,
    pub classification_text: ClassificationText,
}

/// Estado do sistema de arrefecimento.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Cooling {
    pub system_active: bool,
    pub fan_on: bool,
    /// Bomba d'água elétrica
    pub ewp_on: bool,
    pub current_temp: f64,
    pub cutoff_active: bool,
}

/// Saúde do microcontrolador.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SystemHealth {
    /// Bytes livres no heap
    pub free_heap: u32,
    /// Uptime em milissegundos
    pub uptime: u64,
    /// dBm (negativo)
    pub wifi_rssi: i32,
}

// ──────────────────────────────────────────────
// Registro completo
// ──────────────────────────────────────────────

/// Registro completo de telemetria enviado via `POST /api/telemetry`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TelemetryRecord {
    pub device_id: String,
    pub system_status: SystemStatus,
    pub lap_number: u32,
    /// ISO-8601 em UTC com sufixo `Z`
    pub timestamp: String,
    pub sensors: Sensors,
    pub gps: Gps,
    pub ai_classification: AiClassification,
    pub cooling: Cooling,
    pub system_health: SystemHealth,
}

// ──────────────────────────────────────────────
// Respostas da API
// ──────────────────────────────────────────────

/// Resposta do `POST /api/telemetry`.
///
/// Mantida como mapa cru: o contrato só exige `status == "success"` e a
/// presença da chave `message`, seja qual for o seu valor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct TelemetryAck(pub Map<String, Value>);

impl TelemetryAck {
    pub fn status(&self) -> Option<&str> {
        self.0.get("status").and_then(Value::as_str)
    }

    pub fn is_success(&self) -> bool {
        self.status() == Some("success")
    }

    /// `true` se a chave `message` existe (mesmo `null`).
    pub fn has_message(&self) -> bool {
        self.0.contains_key("message")
    }

    pub fn message(&self) -> Option<&Value> {
        self.0.get("message")
    }
}

/// Campos que toda linha do histórico deve conter.
pub const HISTORY_REQUIRED_FIELDS: [&str; 5] =
    ["timestamp", "device_id", "rpm", "temperature", "afr"];

/// Uma linha de `GET /api/history`.
///
/// O servidor devolve as linhas do seu armazenamento como objetos planos
/// (muitas vezes com todos os valores em string), então mantemos o mapa cru.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct HistoryEntry(pub Map<String, Value>);

impl HistoryEntry {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Campos obrigatórios ausentes nesta linha.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        HISTORY_REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|f| !self.0.contains_key(*f))
            .collect()
    }
}

/// Agregados de um campo numérico em `GET /api/stats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FieldStats {
    pub avg: f64,
    pub max: f64,
    pub min: f64,
    pub latest: f64,
}

/// Chaves que um `GET /api/stats` não vazio deve conter.
pub const STATS_REQUIRED_FIELDS: [&str; 2] = ["totalRecords", "lastUpdate"];

/// Resposta de `GET /api/stats`.
///
/// Um servidor sem dados responde `{}`. O objeto cru é mantido e os
/// acessores tipados são tolerantes a formatos inesperados.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ApiStats(pub Map<String, Value>);

impl ApiStats {
    /// `true` quando o servidor respondeu `{}`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total_records(&self) -> Option<u64> {
        self.0.get("totalRecords").and_then(Value::as_u64)
    }

    pub fn last_update(&self) -> Option<&str> {
        self.0.get("lastUpdate").and_then(Value::as_str)
    }

    /// Agregados de um campo (`rpm`, `temperature`, …), se tiverem formato de objeto.
    pub fn field(&self, name: &str) -> Option<FieldStats> {
        match self.0.get(name)? {
            v @ Value::Object(_) => serde_json::from_value(v.clone()).ok(),
            _ => None,
        }
    }

    /// Chaves obrigatórias ausentes (vazio para `{}`, que é aceito).
    pub fn missing_fields(&self) -> Vec<&'static str> {
        if self.is_empty() {
            return Vec::new();
        }
        STATS_REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|f| !self.0.contains_key(*f))
            .collect()
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_serializes_with_wire_names() {
        let record = TelemetryRecord {
            device_id: "racing-car-001".into(),
            system_status: SystemStatus::Recording,
            lap_number: 3,
            timestamp: "2026-01-01T10:00:00.000Z".into(),
            ai_classification: AiClassification {
                classification: 1,
                classification_text: ClassificationText::Warning,
            },
            system_health: SystemHealth {
                free_heap: 250_000,
                uptime: 3_600_000,
                wifi_rssi: -55,
            },
            ..Default::default()
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["system_status"], "RECORDING");
        assert_eq!(value["lap_number"], 3);
        assert_eq!(value["ai_classification"]["classification_text"], "Warning");
        assert_eq!(value["system_health"]["wifi_rssi"], -55);
        assert!(value["sensors"].get("map_value").is_some());
        assert_eq!(value["cooling"]["cutoff_active"], false);
    }

    #[test]
    fn classification_code_mapping() {
        for code in 0..=2 {
            assert_eq!(ClassificationText::from_code(code).code(), code);
        }
        assert_eq!(ClassificationText::from_code(7), ClassificationText::Critical);
    }

    #[test]
    fn empty_stats_object_parses() {
        let stats: ApiStats = serde_json::from_value(json!({})).unwrap();
        assert!(stats.is_empty());
        assert!(stats.missing_fields().is_empty());
    }

    #[test]
    fn stats_typed_view() {
        let stats: ApiStats = serde_json::from_value(json!({
            "totalRecords": 12,
            "lastUpdate": "2026-01-01T10:00:00.000Z",
            "rpm": { "avg": 5000.0, "max": 9000.0, "min": 1000.0, "latest": 4200.0 },
            "speed": { "avg": 1.0 }
        }))
        .unwrap();
        assert_eq!(stats.total_records(), Some(12));
        assert_eq!(stats.field("rpm").map(|r| r.max), Some(9000.0));
        assert!(stats.missing_fields().is_empty());
    }

    #[test]
    fn stats_tolerates_odd_shapes() {
        let stats: ApiStats = serde_json::from_value(json!({
            "totalRecords": null,
            "lastUpdate": 17,
            "rpm": { "avg": 1.0 },
            "afr": "n/a"
        }))
        .unwrap();
        // Chaves presentes, mesmo com valores estranhos.
        assert!(stats.missing_fields().is_empty());
        assert_eq!(stats.total_records(), None);
        assert_eq!(stats.field("rpm").map(|r| (r.avg, r.max)), Some((1.0, 0.0)));
        assert_eq!(stats.field("afr"), None);
    }

    #[test]
    fn non_empty_stats_without_required_keys() {
        let stats: ApiStats = serde_json::from_value(json!({ "rpm": {} })).unwrap();
        assert_eq!(stats.missing_fields(), vec!["totalRecords", "lastUpdate"]);
    }

    #[test]
    fn ack_only_needs_message_key() {
        let null_message: TelemetryAck =
            serde_json::from_value(json!({ "status": "success", "message": null })).unwrap();
        assert!(null_message.is_success());
        assert!(null_message.has_message());

        let object_message: TelemetryAck =
            serde_json::from_value(json!({ "status": "success", "message": { "id": 1 } })).unwrap();
        assert!(object_message.has_message());

        let bare: TelemetryAck = serde_json::from_value(json!({ "status": "error" })).unwrap();
        assert!(!bare.is_success());
        assert!(!bare.has_message());
    }

    #[test]
    fn history_entry_reports_missing_fields() {
        let entry: HistoryEntry = serde_json::from_value(json!({
            "timestamp": "2026-01-01T10:00:00.000Z",
            "device_id": "racing-car-001",
            "rpm": "4500"
        }))
        .unwrap();
        assert_eq!(entry.missing_fields(), vec!["temperature", "afr"]);
    }
}

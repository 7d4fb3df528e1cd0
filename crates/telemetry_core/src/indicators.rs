//! Indicadores do painel – níveis calculados a partir de um registro.
//!
//! Mesmas regras dos cards do dashboard: temperatura do motor, sinal de
//! GPS, arrefecimento e status do sistema.

use crate::types::{SystemStatus, TelemetryRecord};

/// Temperatura do motor acima da qual o card fica em alerta (°C).
pub const ENGINE_TEMP_WARNING: f64 = 90.0;
/// Temperatura do motor acima da qual o card fica crítico (°C).
pub const ENGINE_TEMP_CRITICAL: f64 = 100.0;
/// Satélites necessários para o card de GPS ficar normal (estritamente acima).
pub const MIN_GPS_SATELLITES: u32 = 4;

/// Nível de um indicador.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IndicatorLevel {
    Normal,
    Warning,
    Critical,
}

/// Card do painel avaliado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Card {
    System,
    Engine,
    Gps,
    Cooling,
}

/// Um indicador fora do normal.
#[derive(Debug, Clone, PartialEq)]
pub struct Indicator {
    pub card: Card,
    pub level: IndicatorLevel,
    pub message: String,
}

/// Avalia um registro e devolve os indicadores que não estão normais.
pub fn evaluate_indicators(record: &TelemetryRecord) -> Vec<Indicator> {
    let mut out = Vec::new();

    let temp = record.sensors.temperature;
    let level = level_for_temperature(temp);
    if level != IndicatorLevel::Normal {
        out.push(Indicator {
            card: Card::Engine,
            level,
            message: format!("Motor {temp:.1}°C"),
        });
    }

    let sats = record.gps.satellites;
    if sats <= MIN_GPS_SATELLITES {
        out.push(Indicator {
            card: Card::Gps,
            level: IndicatorLevel::Warning,
            message: format!("GPS com {sats} satélites"),
        });
    }

    if !record.cooling.system_active {
        out.push(Indicator {
            card: Card::Cooling,
            level: IndicatorLevel::Warning,
            message: "Arrefecimento inativo".into(),
        });
    }

    let level = level_for_status(record.system_status);
    if level != IndicatorLevel::Normal {
        out.push(Indicator {
            card: Card::System,
            level,
            message: format!("Status {:?}", record.system_status),
        });
    }

    out
}

/// Nível do card do motor para uma temperatura.
pub fn level_for_temperature(temp: f64) -> IndicatorLevel {
    if temp > ENGINE_TEMP_CRITICAL {
        IndicatorLevel::Critical
    } else if temp > ENGINE_TEMP_WARNING {
        IndicatorLevel::Warning
    } else {
        IndicatorLevel::Normal
    }
}

/// Nenhum dos status que o gerador produz é anormal.
pub fn level_for_status(status: SystemStatus) -> IndicatorLevel {
    match status {
        SystemStatus::Idle | SystemStatus::Recording | SystemStatus::Transmitting => {
            IndicatorLevel::Normal
        }
    }
}

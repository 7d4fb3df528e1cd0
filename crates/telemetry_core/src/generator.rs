//! Gerador de registros sintéticos de telemetria.
//!
//! Cada [`Profile`] reproduz uma distribuição de valores:
//! - [`Profile::Random`] – valores amplos, usados pelo sender periódico
//! - [`Profile::Realistic`] – condições de corrida (marchas, temperatura estável)
//! - [`Profile::Sample`] – faixas usadas pela suíte de aceitação

use chrono::{SecondsFormat, Utc};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};

use crate::types::*;

/// Device ID padrão dos scripts de teste.
pub const DEFAULT_DEVICE_ID: &str = "racing-car-001";

/// RPM base por marcha no perfil realista.
const GEAR_RPM: [u32; 4] = [2000, 4000, 6000, 8000];

/// Pesos Normal/Warning/Critical no perfil realista.
const CLASSIFICATION_WEIGHTS: [u32; 3] = [70, 25, 5];

/// Centro da pista simulada (lat, lon).
const TRACK_CENTER: (f64, f64) = (-6.200000, 106.816666);

/// Distribuição de valores do gerador.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Random,
    Realistic,
    Sample,
}

/// Gerador de [`TelemetryRecord`] com contador de voltas interno.
pub struct TelemetryGenerator<R: Rng = StdRng> {
    profile: Profile,
    device_id: String,
    status: SystemStatus,
    next_lap: u32,
    rng: R,
}

impl TelemetryGenerator<StdRng> {
    pub fn new(profile: Profile, device_id: impl Into<String>) -> Self {
        Self::with_rng(profile, device_id, StdRng::from_entropy())
    }

    /// Gerador determinístico (testes).
    pub fn seeded(profile: Profile, device_id: impl Into<String>, seed: u64) -> Self {
        Self::with_rng(profile, device_id, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> TelemetryGenerator<R> {
    pub fn with_rng(profile: Profile, device_id: impl Into<String>, rng: R) -> Self {
        Self {
            profile,
            device_id: device_id.into(),
            status: SystemStatus::Recording,
            next_lap: 1,
            rng,
        }
    }

    /// Status fixo usado pelo perfil `Sample` (padrão `RECORDING`).
    pub fn with_status(mut self, status: SystemStatus) -> Self {
        self.status = status;
        self
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    /// Próxima volta que [`next_record`](Self::next_record) vai usar.
    pub fn current_lap(&self) -> u32 {
        self.next_lap
    }

    /// Gera um registro usando o contador de voltas e avança o contador.
    ///
    /// No perfil `Random` a volta é sorteada (1–20) e o contador é ignorado.
    pub fn next_record(&mut self) -> TelemetryRecord {
        let lap = self.next_lap;
        self.next_lap = self.next_lap.saturating_add(1);
        self.generate(lap)
    }

    /// Gera um registro para a volta informada.
    pub fn generate(&mut self, lap: u32) -> TelemetryRecord {
        match self.profile {
            Profile::Random => self.random_record(),
            Profile::Realistic => self.realistic_record(lap),
            Profile::Sample => self.sample_record(lap),
        }
    }

    // ── Perfis ──

    fn random_record(&mut self) -> TelemetryRecord {
        let rng = &mut self.rng;
        let status = *SystemStatus::ALL.choose(rng).unwrap_or(&SystemStatus::Idle);
        let lap = rng.gen_range(1..=20);
        let classification = rng.gen_range(0..=2);

        TelemetryRecord {
            device_id: self.device_id.clone(),
            system_status: status,
            lap_number: lap,
            timestamp: timestamp_now(),
            sensors: Sensors {
                afr: uniform(rng, 12.0, 16.0, 1),
                rpm: rng.gen_range(1000..=9000),
                temperature: uniform(rng, 70.0, 120.0, 1),
                tps: uniform(rng, 0.0, 100.0, 1),
                map_value: uniform(rng, 60.0, 150.0, 1),
                incline: uniform(rng, -10.0, 10.0, 1),
                stroke: uniform(rng, 5.0, 10.0, 1),
            },
            gps: Gps {
                latitude: uniform(rng, -6.5, -6.0, 6),
                longitude: uniform(rng, 106.5, 107.0, 6),
                speed: rng.gen_range(0..=200),
                satellites: rng.gen_range(3..=12),
            },
            ai_classification: classification_for(classification),
            cooling: Cooling {
                system_active: rng.gen_bool(0.5),
                fan_on: rng.gen_bool(0.5),
                ewp_on: rng.gen_bool(0.5),
                current_temp: uniform(rng, 70.0, 110.0, 1),
                cutoff_active: false,
            },
            system_health: SystemHealth {
                free_heap: rng.gen_range(150_000..=300_000),
                uptime: rng.gen_range(1_000..=10_000_000),
                wifi_rssi: rng.gen_range(-90..=-30),
            },
        }
    }

    fn realistic_record(&mut self, lap: u32) -> TelemetryRecord {
        let rng = &mut self.rng;
        let rpm_base = *GEAR_RPM.choose(rng).unwrap_or(&GEAR_RPM[0]);
        let rpm = rpm_base.saturating_add_signed(rng.gen_range(-500..=500));
        let temp_variation: f64 = rng.gen_range(-5.0..=15.0);
        let engine_temp = round_to(85.0 + temp_variation, 1);

        let classification = match WeightedIndex::new(CLASSIFICATION_WEIGHTS) {
            Ok(dist) => dist.sample(rng) as u8,
            Err(_) => 0,
        };

        TelemetryRecord {
            device_id: self.device_id.clone(),
            system_status: SystemStatus::Recording,
            lap_number: lap,
            timestamp: timestamp_now(),
            sensors: Sensors {
                afr: uniform(rng, 13.5, 15.2, 1),
                rpm,
                temperature: engine_temp,
                tps: uniform(rng, 10.0, 95.0, 1),
                map_value: uniform(rng, 80.0, 150.0, 1),
                incline: uniform(rng, -5.0, 5.0, 1),
                stroke: uniform(rng, 6.0, 8.5, 1),
            },
            gps: Gps {
                latitude: TRACK_CENTER.0 + rng.gen_range(-0.01..=0.01),
                longitude: TRACK_CENTER.1 + rng.gen_range(-0.01..=0.01),
                speed: rng.gen_range(50..=180),
                satellites: rng.gen_range(6..=10),
            },
            ai_classification: classification_for(classification),
            // Arrefecimento sempre ligado durante a corrida
            cooling: Cooling {
                system_active: true,
                fan_on: rng.gen_bool(0.5),
                ewp_on: true,
                current_temp: engine_temp,
                cutoff_active: false,
            },
            system_health: SystemHealth {
                free_heap: rng.gen_range(220_000..=280_000),
                uptime: rng.gen_range(3_600_000..=7_200_000),
                wifi_rssi: rng.gen_range(-70..=-40),
            },
        }
    }

    fn sample_record(&mut self, lap: u32) -> TelemetryRecord {
        let rng = &mut self.rng;
        let classification = rng.gen_range(0..=2);

        TelemetryRecord {
            device_id: self.device_id.clone(),
            system_status: self.status,
            lap_number: lap,
            timestamp: timestamp_now(),
            sensors: Sensors {
                afr: uniform(rng, 12.0, 16.0, 1),
                rpm: rng.gen_range(1000..=8000),
                temperature: uniform(rng, 70.0, 120.0, 1),
                tps: uniform(rng, 0.0, 100.0, 1),
                map_value: uniform(rng, 50.0, 200.0, 1),
                incline: uniform(rng, -10.0, 10.0, 1),
                stroke: uniform(rng, 5.0, 10.0, 1),
            },
            gps: Gps {
                latitude: uniform(rng, -6.5, -6.0, 6),
                longitude: uniform(rng, 106.5, 107.0, 6),
                speed: rng.gen_range(0..=200),
                satellites: rng.gen_range(4..=12),
            },
            ai_classification: classification_for(classification),
            cooling: Cooling {
                system_active: rng.gen_bool(0.5),
                fan_on: rng.gen_bool(0.5),
                ewp_on: rng.gen_bool(0.5),
                current_temp: uniform(rng, 70.0, 110.0, 1),
                cutoff_active: false,
            },
            system_health: SystemHealth {
                free_heap: rng.gen_range(200_000..=300_000),
                uptime: rng.gen_range(3_600_000..=86_400_000),
                wifi_rssi: rng.gen_range(-80..=-30),
            },
        }
    }
}

/// Corpos malformados usados para testar o tratamento de erro do servidor.
pub fn invalid_payloads() -> Vec<Value> {
    vec![
        json!({}),
        json!({ "invalid": "data" }),
        json!({ "device_id": null }),
        json!("not_json_object"),
    ]
}

/// Timestamp ISO-8601 atual, UTC, milissegundos e sufixo `Z`.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn classification_for(code: u8) -> AiClassification {
    AiClassification {
        classification: code,
        classification_text: ClassificationText::from_code(code),
    }
}

fn uniform<R: Rng>(rng: &mut R, low: f64, high: f64, decimals: i32) -> f64 {
    round_to(rng.gen_range(low..=high), decimals)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const DRAWS: usize = 500;

    fn has_decimals(value: f64, decimals: i32) -> bool {
        (round_to(value, decimals) - value).abs() < 1e-9
    }

    #[test]
    fn random_profile_stays_in_range() {
        let mut g = TelemetryGenerator::seeded(Profile::Random, DEFAULT_DEVICE_ID, 7);
        for _ in 0..DRAWS {
            let r = g.next_record();
            assert_eq!(r.device_id, DEFAULT_DEVICE_ID);
            assert!((1..=20).contains(&r.lap_number));
            assert!((12.0..=16.0).contains(&r.sensors.afr));
            assert!((1000..=9000).contains(&r.sensors.rpm));
            assert!((70.0..=120.0).contains(&r.sensors.temperature));
            assert!((60.0..=150.0).contains(&r.sensors.map_value));
            assert!((-6.5..=-6.0).contains(&r.gps.latitude));
            assert!((106.5..=107.0).contains(&r.gps.longitude));
            assert!((3..=12).contains(&r.gps.satellites));
            assert!((150_000..=300_000).contains(&r.system_health.free_heap));
            assert!((-90..=-30).contains(&r.system_health.wifi_rssi));
            assert!(has_decimals(r.sensors.tps, 1));
            assert!(has_decimals(r.gps.latitude, 6));
            assert!(!r.cooling.cutoff_active);
        }
    }

    #[test]
    fn realistic_profile_follows_race_conditions() {
        let mut g = TelemetryGenerator::seeded(Profile::Realistic, DEFAULT_DEVICE_ID, 11);
        for _ in 0..DRAWS {
            let r = g.next_record();
            assert_eq!(r.system_status, SystemStatus::Recording);
            assert!((1500..=8500).contains(&r.sensors.rpm));
            assert!((80.0..=100.0).contains(&r.sensors.temperature));
            assert_eq!(r.sensors.temperature, r.cooling.current_temp);
            assert!((50..=180).contains(&r.gps.speed));
            assert!((6..=10).contains(&r.gps.satellites));
            assert!((TRACK_CENTER.0 - r.gps.latitude).abs() <= 0.01 + 1e-9);
            assert!(r.cooling.system_active);
            assert!(r.cooling.ewp_on);
            assert!((3_600_000..=7_200_000).contains(&r.system_health.uptime));
            assert!((-70..=-40).contains(&r.system_health.wifi_rssi));
        }
    }

    #[test]
    fn realistic_classification_is_mostly_normal() {
        let mut g = TelemetryGenerator::seeded(Profile::Realistic, DEFAULT_DEVICE_ID, 3);
        let normal = (0..1000)
            .filter(|_| g.next_record().ai_classification.classification == 0)
            .count();
        assert!(normal > 550, "esperado ~70% Normal, obtido {normal}/1000");
    }

    #[test]
    fn sample_profile_uses_given_status_and_lap() {
        let mut g = TelemetryGenerator::seeded(Profile::Sample, DEFAULT_DEVICE_ID, 5)
            .with_status(SystemStatus::Transmitting);
        let r = g.generate(9);
        assert_eq!(r.lap_number, 9);
        assert_eq!(r.system_status, SystemStatus::Transmitting);
        assert!((50.0..=200.0).contains(&r.sensors.map_value));
        assert!((4..=12).contains(&r.gps.satellites));
    }

    #[test]
    fn lap_counter_is_monotonic_from_one() {
        let mut g = TelemetryGenerator::seeded(Profile::Realistic, DEFAULT_DEVICE_ID, 1);
        assert_eq!(g.current_lap(), 1);
        let laps: Vec<u32> = (0..5).map(|_| g.next_record().lap_number).collect();
        assert_eq!(laps, vec![1, 2, 3, 4, 5]);
        assert_eq!(g.current_lap(), 6);
    }

    #[test]
    fn classification_text_matches_code() {
        let mut g = TelemetryGenerator::seeded(Profile::Random, DEFAULT_DEVICE_ID, 42);
        for _ in 0..DRAWS {
            let c = g.next_record().ai_classification;
            assert_eq!(c.classification_text.code(), c.classification);
        }
    }

    #[test]
    fn timestamp_is_utc_with_z_suffix() {
        let ts = timestamp_now();
        assert!(ts.ends_with('Z'), "{ts}");
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }

    #[test]
    fn invalid_payloads_cover_malformed_bodies() {
        let bodies = invalid_payloads();
        assert_eq!(bodies.len(), 4);
        assert!(bodies.iter().any(|b| b.is_string()));
        assert!(bodies.iter().any(|b| b == &json!({})));
        assert!(bodies.iter().any(|b| b["device_id"].is_null() && b.get("device_id").is_some()));
    }
}

//! Gerador de carga multi-thread.
//!
//! N threads de worker enviam registros realistas durante um tempo fixo.
//! Sucessos e erros são somados em dois contadores protegidos por um
//! único mutex; ao final o [`LoadReport`] resume a vazão.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::api::ApiClient;
use crate::generator::{Profile, TelemetryGenerator};

// ──────────────────────────────────────────────
// Contadores
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub success: u64,
    pub errors: u64,
}

/// Contadores de sucesso/erro compartilhados entre os workers.
#[derive(Debug, Default)]
pub struct LoadCounters {
    inner: Mutex<CounterSnapshot>,
}

impl LoadCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self) {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).success += 1;
    }

    pub fn record_error(&self) {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).errors += 1;
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn reset(&self) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = CounterSnapshot::default();
    }
}

// ──────────────────────────────────────────────
// Cenários
// ──────────────────────────────────────────────

/// Um cenário de carga: N clientes, cada um enviando a cada `interval`.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadScenario {
    pub name: String,
    pub clients: usize,
    pub duration: Duration,
    pub interval: Duration,
}

impl LoadScenario {
    pub fn new(name: impl Into<String>, clients: usize, duration: Duration, interval: Duration) -> Self {
        Self {
            name: name.into(),
            clients,
            duration,
            interval,
        }
    }

    /// 3 clientes, 1 req/s cada, 30 s.
    pub fn normal() -> Self {
        Self::new("Normal Load", 3, Duration::from_secs(30), Duration::from_secs(1))
    }

    /// 2 clientes, 2 req/s cada, 20 s.
    pub fn high_frequency() -> Self {
        Self::new("High Frequency", 2, Duration::from_secs(20), Duration::from_millis(500))
    }

    /// 5 clientes, 1 req/s cada, 30 s.
    pub fn stress() -> Self {
        Self::new("Stress", 5, Duration::from_secs(30), Duration::from_secs(1))
    }

    /// Os três cenários padrão, na ordem em que são executados.
    pub fn standard() -> Vec<Self> {
        vec![Self::normal(), Self::high_frequency(), Self::stress()]
    }

    /// `clients × duration / interval` (infinito se o intervalo for zero).
    pub fn expected_requests(&self) -> f64 {
        let interval = self.interval.as_secs_f64();
        if interval <= 0.0 {
            return f64::INFINITY;
        }
        self.clients as f64 * self.duration.as_secs_f64() / interval
    }
}

// ──────────────────────────────────────────────
// Relatório
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub scenario: String,
    pub total_time: Duration,
    pub success: u64,
    pub errors: u64,
}

impl LoadReport {
    pub fn total_requests(&self) -> u64 {
        self.success + self.errors
    }

    /// Percentual de sucesso (0–100). Zero quando nada foi enviado.
    pub fn success_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            return 0.0;
        }
        self.success as f64 / total as f64 * 100.0
    }

    pub fn requests_per_second(&self) -> f64 {
        per_second(self.total_requests(), self.total_time)
    }

    pub fn successful_per_second(&self) -> f64 {
        per_second(self.success, self.total_time)
    }
}

fn per_second(count: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 { 0.0 } else { count as f64 / secs }
}

// ──────────────────────────────────────────────
// Driver
// ──────────────────────────────────────────────

/// Executa cenários de carga contra a API.
pub struct LoadTest {
    client: ApiClient,
    device_id: String,
    counters: Arc<LoadCounters>,
}

impl LoadTest {
    pub fn new(client: ApiClient, device_id: impl Into<String>) -> Self {
        Self {
            client,
            device_id: device_id.into(),
            counters: Arc::new(LoadCounters::new()),
        }
    }

    pub fn counters(&self) -> &LoadCounters {
        &self.counters
    }

    /// Roda um cenário até o fim e devolve o relatório.
    pub fn run(&self, scenario: &LoadScenario) -> LoadReport {
        info!(
            "Iniciando cenário '{}': {} clientes, {:.0}s, intervalo {:.2}s (~{:.0} requisições esperadas)",
            scenario.name,
            scenario.clients,
            scenario.duration.as_secs_f64(),
            scenario.interval.as_secs_f64(),
            scenario.expected_requests()
        );

        self.counters.reset();
        let started = Instant::now();

        let mut handles = Vec::with_capacity(scenario.clients);
        for id in 0..scenario.clients {
            let client = self.client.clone();
            let counters = Arc::clone(&self.counters);
            let generator = TelemetryGenerator::new(Profile::Realistic, self.device_id.clone());
            let duration = scenario.duration;
            let interval = scenario.interval;

            match std::thread::Builder::new()
                .name(format!("load-worker-{id}"))
                .spawn(move || worker_loop(&client, &counters, generator, duration, interval))
            {
                Ok(handle) => handles.push(handle),
                Err(e) => error!("Falha ao criar worker {id}: {e}"),
            }
        }

        for handle in handles {
            let name = handle.thread().name().unwrap_or("load-worker").to_string();
            if handle.join().is_err() {
                error!("Worker {name} terminou com panic");
            }
        }

        let total_time = started.elapsed();
        let snapshot = self.counters.snapshot();
        let report = LoadReport {
            scenario: scenario.name.clone(),
            total_time,
            success: snapshot.success,
            errors: snapshot.errors,
        };

        info!(
            "Cenário '{}' concluído: {} requisições, {} ok, {} erros em {:.2}s",
            report.scenario,
            report.total_requests(),
            report.success,
            report.errors,
            total_time.as_secs_f64()
        );
        report
    }
}

/// Loop de um worker: envia, conta, dorme, até estourar `duration`.
///
/// A volta só avança quando o servidor responde. Devolve a próxima volta.
fn worker_loop(
    client: &ApiClient,
    counters: &LoadCounters,
    mut generator: TelemetryGenerator,
    duration: Duration,
    interval: Duration,
) -> u32 {
    let started = Instant::now();
    let mut lap = 1;

    while started.elapsed() < duration {
        let record = generator.generate(lap);
        match client.send_telemetry(&record) {
            Ok(outcome) => {
                lap += 1;
                if outcome.is_2xx() {
                    counters.record_success();
                } else {
                    counters.record_error();
                }
                std::thread::sleep(interval);
            }
            Err(e) => {
                // Sem sleep aqui: o timeout da requisição já limita o ritmo.
                counters.record_error();
                warn!("Erro no worker: {e}");
            }
        }
    }
    lap
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_scenarios() {
        let s = LoadScenario::standard();
        assert_eq!(s.len(), 3);
        assert_eq!(s[0].expected_requests(), 90.0);
        assert_eq!(s[1].expected_requests(), 80.0);
        assert_eq!(s[2].expected_requests(), 150.0);
    }

    #[test]
    fn zero_interval_expects_unbounded() {
        let s = LoadScenario::new("burst", 2, Duration::from_secs(1), Duration::ZERO);
        assert!(s.expected_requests().is_infinite());
    }

    #[test]
    fn counters_sum_across_threads() {
        let counters = Arc::new(LoadCounters::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let c = Arc::clone(&counters);
                std::thread::spawn(move || {
                    for n in 0..1000 {
                        if (n + i) % 4 == 0 {
                            c.record_error();
                        } else {
                            c.record_success();
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let snap = counters.snapshot();
        assert_eq!(snap.success + snap.errors, 8000);
        assert_eq!(snap.errors, 2000);

        counters.reset();
        assert_eq!(counters.snapshot(), CounterSnapshot::default());
    }

    #[test]
    fn report_math() {
        let report = LoadReport {
            scenario: "x".into(),
            total_time: Duration::from_secs(10),
            success: 45,
            errors: 5,
        };
        assert_eq!(report.total_requests(), 50);
        assert!((report.success_rate() - 90.0).abs() < 1e-9);
        assert!((report.requests_per_second() - 5.0).abs() < 1e-9);
        assert!((report.successful_per_second() - 4.5).abs() < 1e-9);
    }

    #[test]
    fn empty_report_does_not_divide_by_zero() {
        let report = LoadReport {
            scenario: "vazio".into(),
            total_time: Duration::ZERO,
            success: 0,
            errors: 0,
        };
        assert_eq!(report.success_rate(), 0.0);
        assert_eq!(report.requests_per_second(), 0.0);
    }

    #[test]
    fn lap_stays_put_on_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client =
            ApiClient::new(&format!("http://127.0.0.1:{port}"), Duration::from_millis(100)).unwrap();
        let counters = LoadCounters::new();
        let generator = TelemetryGenerator::seeded(Profile::Realistic, "racing-car-001", 5);
        let next_lap = worker_loop(
            &client,
            &counters,
            generator,
            Duration::from_millis(80),
            Duration::ZERO,
        );

        assert_eq!(next_lap, 1);
        let snapshot = counters.snapshot();
        assert_eq!(snapshot.success, 0);
        assert!(snapshot.errors >= 1);
    }
}

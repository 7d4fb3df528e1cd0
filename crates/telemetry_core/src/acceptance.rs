//! Suíte de aceitação da API de ingestão.
//!
//! Sequência fixa de verificações HTTP contra um servidor real. Falha de
//! conexão com o servidor é sempre reprovação.

use std::time::{Duration, Instant};

use crossbeam_channel::unbounded;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::generator::{TelemetryGenerator, invalid_payloads};
use crate::types::HISTORY_REQUIRED_FIELDS;

/// Fração mínima de sucesso nos testes de múltiplos envios.
pub const MIN_SUCCESS_RATIO: f64 = 0.8;

const MULTIPLE_SENDS: u32 = 5;
const CONCURRENT_SENDS: u32 = 5;
const CONCURRENT_WORKERS: usize = 3;
const HISTORY_SEED_RECORDS: u32 = 3;
const HISTORY_LIMIT: usize = 10;
const STATS_SEED_RECORDS: u32 = 5;
const PERFORMANCE_REQUESTS: u32 = 10;

/// Pausas entre envios de cada verificação.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuiteTiming {
    pub multiple_delay: Duration,
    pub history_delay: Duration,
    pub stats_delay: Duration,
}

impl Default for SuiteTiming {
    fn default() -> Self {
        Self {
            multiple_delay: Duration::from_millis(500),
            history_delay: Duration::from_millis(200),
            stats_delay: Duration::from_millis(100),
        }
    }
}

impl SuiteTiming {
    /// Sem pausas (servidores mock).
    pub fn none() -> Self {
        Self {
            multiple_delay: Duration::ZERO,
            history_delay: Duration::ZERO,
            stats_delay: Duration::ZERO,
        }
    }
}

/// Resultado de uma verificação.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

impl CheckOutcome {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            passed: true,
            detail: detail.into(),
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            passed: false,
            detail: detail.into(),
        }
    }
}

/// Resultado da suíte inteira.
#[derive(Debug, Clone, Default)]
pub struct SuiteReport {
    pub outcomes: Vec<CheckOutcome>,
}

impl SuiteReport {
    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    pub fn failed(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }

    pub fn get(&self, name: &str) -> Option<&CheckOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }
}

/// Suíte de aceitação.
pub struct AcceptanceSuite {
    client: ApiClient,
    perf_client: ApiClient,
    generator: TelemetryGenerator,
    timing: SuiteTiming,
    min_requests_per_sec: f64,
}

impl AcceptanceSuite {
    /// `client` é usado em todas as verificações exceto a de performance,
    /// que usa `perf_client` (timeout menor).
    pub fn new(client: ApiClient, perf_client: ApiClient, generator: TelemetryGenerator) -> Self {
        Self {
            client,
            perf_client,
            generator,
            timing: SuiteTiming::default(),
            min_requests_per_sec: 5.0,
        }
    }

    pub fn with_timing(mut self, timing: SuiteTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_min_requests_per_sec(mut self, rps: f64) -> Self {
        self.min_requests_per_sec = rps;
        self
    }

    /// Executa as oito verificações em ordem.
    pub fn run_all(&mut self) -> SuiteReport {
        let checks: [fn(&mut Self) -> CheckOutcome; 8] = [
            Self::server_is_running,
            Self::send_single,
            Self::send_multiple,
            Self::send_concurrent,
            Self::invalid_data,
            Self::history,
            Self::stats,
            Self::performance,
        ];

        let mut report = SuiteReport::default();
        for check in checks {
            let outcome = check(self);
            if outcome.passed {
                info!("✅ {}: {}", outcome.name, outcome.detail);
            } else {
                warn!("❌ {}: {}", outcome.name, outcome.detail);
            }
            report.outcomes.push(outcome);
        }
        report
    }

    /// `GET /` responde 200 ou 404.
    pub fn server_is_running(&mut self) -> CheckOutcome {
        const NAME: &str = "server_is_running";
        match self.client.ping() {
            Ok(status @ (200 | 404)) => CheckOutcome::pass(NAME, format!("servidor no ar (HTTP {status})")),
            Ok(status) => CheckOutcome::fail(NAME, format!("status inesperado em /: {status}")),
            Err(e) => CheckOutcome::fail(NAME, format!("servidor não está rodando: {e}")),
        }
    }

    /// Um registro, resposta `{"status":"success","message":...}`.
    pub fn send_single(&mut self) -> CheckOutcome {
        const NAME: &str = "send_single";
        let record = self.generator.next_record();
        let outcome = match self.client.send_telemetry(&record) {
            Ok(o) => o,
            Err(e) => return CheckOutcome::fail(NAME, format!("falha ao enviar: {e}")),
        };

        if !outcome.is_success() {
            return CheckOutcome::fail(NAME, format!("esperado HTTP 200, obtido {}", outcome.status));
        }
        match outcome.ack {
            Some(ack) if !ack.is_success() => {
                CheckOutcome::fail(NAME, format!("status da resposta: {:?}", ack.status()))
            }
            Some(ack) if !ack.has_message() => CheckOutcome::fail(NAME, "resposta sem campo 'message'"),
            Some(ack) => CheckOutcome::pass(
                NAME,
                format!("resposta: {}", ack.message().cloned().unwrap_or_default()),
            ),
            None => CheckOutcome::fail(NAME, "corpo da resposta não é um objeto JSON"),
        }
    }

    /// Cinco envios sequenciais, ≥ 80% de sucesso.
    pub fn send_multiple(&mut self) -> CheckOutcome {
        const NAME: &str = "send_multiple";
        let mut success = 0;
        for lap in 1..=MULTIPLE_SENDS {
            let record = self.generator.generate(lap);
            if let Ok(o) = self.client.send_telemetry(&record) {
                if o.is_success() {
                    success += 1;
                }
            }
            std::thread::sleep(self.timing.multiple_delay);
        }
        ratio_outcome(NAME, success, MULTIPLE_SENDS)
    }

    /// Cinco envios distribuídos num pool de três threads.
    pub fn send_concurrent(&mut self) -> CheckOutcome {
        const NAME: &str = "send_concurrent";
        let (job_tx, job_rx) = unbounded();
        for lap in 1..=CONCURRENT_SENDS {
            let _ = job_tx.send(self.generator.generate(lap));
        }
        drop(job_tx);

        let (result_tx, result_rx) = unbounded::<bool>();
        std::thread::scope(|scope| {
            for _ in 0..CONCURRENT_WORKERS {
                let jobs = job_rx.clone();
                let results = result_tx.clone();
                let client = &self.client;
                scope.spawn(move || {
                    for record in jobs.iter() {
                        let ok = client
                            .send_telemetry(&record)
                            .map(|o| o.is_success())
                            .unwrap_or(false);
                        let _ = results.send(ok);
                    }
                });
            }
        });
        drop(result_tx);

        let success = result_rx.iter().filter(|ok| *ok).count() as u32;
        ratio_outcome(NAME, success, CONCURRENT_SENDS)
    }

    /// Corpos malformados: o servidor precisa responder, com qualquer status.
    pub fn invalid_data(&mut self) -> CheckOutcome {
        const NAME: &str = "invalid_data";
        let mut details = Vec::new();
        for (i, body) in invalid_payloads().iter().enumerate() {
            match self.client.send_raw(body) {
                Ok(status) => details.push(format!("#{} → HTTP {status}", i + 1)),
                // Erro de resposta é aceitável aqui; só registramos.
                Err(e) => {
                    warn!("Dado inválido #{}: erro de resposta ({e})", i + 1);
                    details.push(format!("#{} → erro de resposta", i + 1));
                }
            }
        }
        CheckOutcome::pass(NAME, details.join(", "))
    }

    /// Semeia registros e lê `GET /api/history?limit=10`.
    pub fn history(&mut self) -> CheckOutcome {
        const NAME: &str = "history";
        self.seed(HISTORY_SEED_RECORDS, self.timing.history_delay);

        let entries = match self.client.history(HISTORY_LIMIT) {
            Ok(e) => e,
            Err(e) => return CheckOutcome::fail(NAME, format!("falha ao ler histórico: {e}")),
        };

        if let Some(first) = entries.first() {
            let missing = first.missing_fields();
            if !missing.is_empty() {
                return CheckOutcome::fail(
                    NAME,
                    format!("registro sem campos {missing:?} (esperados {HISTORY_REQUIRED_FIELDS:?})"),
                );
            }
        }
        CheckOutcome::pass(NAME, format!("{} registros", entries.len()))
    }

    /// Semeia registros e lê `GET /api/stats`.
    pub fn stats(&mut self) -> CheckOutcome {
        const NAME: &str = "stats";
        self.seed(STATS_SEED_RECORDS, self.timing.stats_delay);

        let stats = match self.client.stats() {
            Ok(s) => s,
            Err(e) => return CheckOutcome::fail(NAME, format!("falha ao ler estatísticas: {e}")),
        };

        let missing = stats.missing_fields();
        if !missing.is_empty() {
            return CheckOutcome::fail(NAME, format!("estatísticas sem {missing:?}"));
        }
        CheckOutcome::pass(
            NAME,
            format!("total de registros: {}", stats.total_records().unwrap_or(0)),
        )
    }

    /// Dez envios sequenciais, vazão mínima em req/s.
    pub fn performance(&mut self) -> CheckOutcome {
        const NAME: &str = "performance";
        let started = Instant::now();
        let mut success = 0;
        for lap in 1..=PERFORMANCE_REQUESTS {
            let record = self.generator.generate(lap);
            if let Ok(o) = self.perf_client.send_telemetry(&record) {
                if o.is_success() {
                    success += 1;
                }
            }
        }
        let secs = started.elapsed().as_secs_f64();
        let rps = if secs > 0.0 {
            PERFORMANCE_REQUESTS as f64 / secs
        } else {
            f64::INFINITY
        };

        let detail = format!("{rps:.2} req/s, {success}/{PERFORMANCE_REQUESTS} com sucesso");
        if rps > self.min_requests_per_sec {
            CheckOutcome::pass(NAME, detail)
        } else {
            CheckOutcome::fail(NAME, format!("{detail} (mínimo {} req/s)", self.min_requests_per_sec))
        }
    }

    /// Envia `count` registros ignorando o resultado.
    fn seed(&mut self, count: u32, delay: Duration) {
        for lap in 1..=count {
            let record = self.generator.generate(lap);
            if let Err(e) = self.client.send_telemetry(&record) {
                warn!("Falha ao semear registro {lap}: {e}");
            }
            std::thread::sleep(delay);
        }
    }
}

fn ratio_outcome(name: &'static str, success: u32, total: u32) -> CheckOutcome {
    let ratio = if total == 0 {
        0.0
    } else {
        success as f64 / total as f64
    };
    let detail = format!("{success}/{total} com sucesso");
    if ratio >= MIN_SUCCESS_RATIO {
        CheckOutcome::pass(name, detail)
    } else {
        CheckOutcome::fail(name, detail)
    }
}

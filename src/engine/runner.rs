use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::RAPID_FIRE_DELAY;
use crate::engine::{Executor, RunMode};
use crate::models::{RequestOutcome, RequestSpec};

/// Lanza las peticiones de un caso según el modo y devuelve todos los resultados.
///
/// Ningún fallo individual corta el lote: siempre vuelven `mode.expected_outcomes()`
/// resultados.
pub async fn run(
    request: &RequestSpec,
    mode: RunMode,
    executor: Arc<dyn Executor>,
) -> Vec<RequestOutcome> {
    match mode {
        RunMode::Single => vec![executor.execute(request).await],
        RunMode::Concurrent(n) => run_concurrent(request, n, executor).await,
        RunMode::RapidFire(n) | RunMode::Repeat(n) => run_paced(request, n, executor).await,
    }
}

/// N tareas en paralelo, una por petición
async fn run_concurrent(
    request: &RequestSpec,
    workers: usize,
    executor: Arc<dyn Executor>,
) -> Vec<RequestOutcome> {
    let shared = Arc::new(request.clone());
    let mut tasks = JoinSet::new();

    for _ in 0..workers {
        let executor = Arc::clone(&executor);
        let request = Arc::clone(&shared);
        tasks.spawn(async move { executor.execute(&request).await });
    }

    let mut outcomes = Vec::with_capacity(workers);
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                warn!(error = %e, "una tarea concurrente terminó sin resultado");
                outcomes.push(RequestOutcome::transport_failure(
                    format!("tarea abortada: {}", e),
                    0,
                ));
            }
        }
    }

    debug!(workers, collected = outcomes.len(), "lote concurrente completo");
    outcomes
}

/// N peticiones en serie con una pausa fija entre ellas
async fn run_paced(
    request: &RequestSpec,
    count: usize,
    executor: Arc<dyn Executor>,
) -> Vec<RequestOutcome> {
    let mut outcomes = Vec::with_capacity(count);

    for i in 0..count {
        outcomes.push(executor.execute(request).await);
        if i + 1 < count {
            sleep(RAPID_FIRE_DELAY).await;
        }
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HttpMethod;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    /// Falla cada tercera petición y cuenta las llamadas en vuelo
    struct Flaky {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        hold: Duration,
    }

    impl Flaky {
        fn new(hold: Duration) -> Self {
            Flaky {
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                hold,
            }
        }
    }

    #[async_trait]
    impl Executor for Flaky {
        async fn execute(&self, _request: &RequestSpec) -> RequestOutcome {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            sleep(self.hold).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if n % 3 == 0 {
                RequestOutcome::transport_failure("timeout", 0)
            } else {
                RequestOutcome::from_status(200, String::new(), 0)
            }
        }
    }

    fn request() -> RequestSpec {
        RequestSpec::new(HttpMethod::Post, "http://localhost/api")
    }

    #[tokio::test]
    async fn concurrent_collects_every_outcome_and_runs_in_parallel() {
        let flaky = Arc::new(Flaky::new(Duration::from_millis(50)));
        let outcomes = run(&request(), RunMode::Concurrent(9), flaky.clone()).await;

        assert_eq!(outcomes.len(), 9);
        assert_eq!(outcomes.iter().filter(|o| !o.success).count(), 3);
        assert!(flaky.max_in_flight.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn rapid_fire_is_serial_and_paced() {
        let flaky = Arc::new(Flaky::new(Duration::ZERO));
        let started = Instant::now();
        let outcomes = run(&request(), RunMode::RapidFire(6), flaky.clone()).await;

        assert_eq!(outcomes.len(), 6);
        assert_eq!(flaky.max_in_flight.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() >= RAPID_FIRE_DELAY * 5);
    }

    #[tokio::test]
    async fn repeat_keeps_failed_outcomes() {
        let flaky = Arc::new(Flaky::new(Duration::ZERO));
        let outcomes = run(&request(), RunMode::Repeat(4), flaky).await;

        assert_eq!(outcomes.len(), 4);
        assert!(!outcomes[2].success);
        assert!(outcomes[3].success);
    }
}

use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::engine::rules::success_count;
use crate::engine::{runner, AcceptanceRule, AdminRule, Executor, SecurityRule, StressRule};
use crate::models::{Category, RequestOutcome, TestCase, Verdict};

/// Ejecuta un caso de principio a fin y emite su veredicto.
///
/// Es el mismo camino para la ejecución inicial y para el retest.
pub async fn evaluate(
    category: Category,
    case: &TestCase,
    executor: Arc<dyn Executor>,
) -> Verdict {
    let started = Instant::now();
    let rule = AcceptanceRule::for_case(category, case);

    let verdict = match &rule {
        AcceptanceRule::Unclassified(reason) => {
            warn!(test = %case.name, %reason, "caso sin regla de aceptación");
            Verdict::fail(
                &case.name,
                category,
                "Caso sin regla de aceptación",
                reason.clone(),
            )
        }
        AcceptanceRule::Workflow(_) if !case.steps.is_empty() => {
            run_steps(category, case, executor).await
        }
        _ => match rule.run_mode() {
            Some(mode) => {
                let outcomes = runner::run(&case.request, mode, executor).await;
                classify(&rule, category, &case.name, &outcomes)
            }
            None => Verdict::fail(
                &case.name,
                category,
                "Caso sin regla de aceptación",
                "la regla no define cómo ejecutarse",
            ),
        },
    };

    let verdict = verdict.with_duration(started.elapsed().as_secs_f64() * 1000.0);
    info!(
        test = %verdict.test_name,
        category = %category,
        passed = verdict.passed,
        duration_ms = verdict.duration_ms,
        "veredicto"
    );
    verdict
}

/// Aplica la regla a los resultados ya recogidos
pub fn classify(
    rule: &AcceptanceRule,
    category: Category,
    name: &str,
    outcomes: &[RequestOutcome],
) -> Verdict {
    match rule {
        AcceptanceRule::Stress(stress) => classify_stress(*stress, category, name, outcomes),
        AcceptanceRule::Security(security) => match outcomes.first() {
            Some(outcome) => classify_security(*security, category, name, outcome),
            None => Verdict::fail(name, category, "Sin resultados", "no se ejecutó la sonda"),
        },
        AcceptanceRule::Workflow(_) => match outcomes.first() {
            Some(outcome) if outcome.success => Verdict::pass(name, category, outcome.body.clone()),
            Some(outcome) => failed_call(name, category, outcome),
            None => Verdict::fail(name, category, "Sin resultados", ""),
        },
        AcceptanceRule::Admin(admin) => classify_admin(*admin, category, name, outcomes),
        AcceptanceRule::Unclassified(reason) => {
            Verdict::fail(name, category, "Caso sin regla de aceptación", reason.clone())
        }
    }
}

fn classify_stress(
    rule: StressRule,
    category: Category,
    name: &str,
    outcomes: &[RequestOutcome],
) -> Verdict {
    if let StressRule::Single = rule {
        return match outcomes.first() {
            Some(outcome) if rule.accepts(outcomes) => {
                Verdict::pass(name, category, format!("Status {}", outcome.status_label()))
            }
            Some(outcome) => failed_call(name, category, outcome),
            None => Verdict::fail(name, category, "Sin resultados", ""),
        };
    }

    let successes = success_count(outcomes);
    let details = format!("Éxitos: {}/{}", successes, outcomes.len());

    if rule.accepts(outcomes) {
        Verdict::pass(name, category, details)
    } else {
        let error = match rule {
            StressRule::Concurrent(_) => "No todas las peticiones concurrentes tuvieron éxito",
            _ => "Menos del 80% de las peticiones tuvo éxito",
        };
        Verdict::fail(name, category, error, details)
    }
}

fn classify_security(
    rule: SecurityRule,
    category: Category,
    name: &str,
    outcome: &RequestOutcome,
) -> Verdict {
    if rule.accepts(outcome) {
        return Verdict::pass(
            name,
            category,
            format!("{} (status {})", rule.confirmed(), outcome.status_label()),
        );
    }

    let error = match (&outcome.error, outcome.status_code) {
        (Some(transport), None) => format!("Sin respuesta del servidor: {}", transport),
        _ => format!(
            "Status {} inesperado: {}",
            outcome.status_label(),
            rule.describe()
        ),
    };
    Verdict::fail(name, category, error, outcome.body.clone())
}

fn classify_admin(
    rule: AdminRule,
    category: Category,
    name: &str,
    outcomes: &[RequestOutcome],
) -> Verdict {
    match rule {
        AdminRule::Single => match outcomes.first() {
            Some(outcome) if outcome.success => Verdict::pass(
                name,
                category,
                format!("Status {}: {}", outcome.status_label(), outcome.body),
            ),
            Some(outcome) => failed_call(name, category, outcome),
            None => Verdict::fail(name, category, "Sin resultados", ""),
        },
        AdminRule::Repeat(n) => {
            let failed = AdminRule::failed_attempts(outcomes);
            if failed.is_empty() && outcomes.len() == n {
                Verdict::pass(name, category, format!("{} intentos sin rechazos", n))
            } else {
                let listed = failed
                    .iter()
                    .map(|i| i.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                Verdict::fail(
                    name,
                    category,
                    format!("{} de {} intentos fallaron", failed.len(), n),
                    format!("Intentos fallidos: {}", listed),
                )
            }
        }
    }
}

/// Flujo por pasos: se detiene en el primer paso que falla
async fn run_steps(category: Category, case: &TestCase, executor: Arc<dyn Executor>) -> Verdict {
    let total = case.steps.len();

    for (completed, step) in case.steps.iter().enumerate() {
        let outcome = executor.execute(&step.request).await;
        if !outcome.success {
            let cause = outcome
                .error
                .clone()
                .unwrap_or_else(|| format!("status {}", outcome.status_label()));
            return Verdict::fail(
                &case.name,
                category,
                format!("Falló el paso '{}': {}", step.action, cause),
                format!("Completados {}/{} pasos", completed, total),
            );
        }
    }

    Verdict::pass(
        &case.name,
        category,
        format!("Completados {}/{} pasos", total, total),
    )
}

fn failed_call(name: &str, category: Category, outcome: &RequestOutcome) -> Verdict {
    let error = outcome
        .error
        .clone()
        .unwrap_or_else(|| format!("Status {}", outcome.status_label()));
    Verdict::fail(name, category, error, outcome.body.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HttpMethod, RequestSpec, Step};
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Responde por endpoint con un status fijo; sin entrada = fallo de transporte
    struct Scripted(HashMap<String, u16>);

    #[async_trait]
    impl Executor for Scripted {
        async fn execute(&self, request: &RequestSpec) -> RequestOutcome {
            match self.0.get(&request.endpoint) {
                Some(code) => RequestOutcome::from_status(*code, "body".to_string(), 1),
                None => RequestOutcome::transport_failure("connection refused", 1),
            }
        }
    }

    fn scripted(entries: &[(&str, u16)]) -> Arc<dyn Executor> {
        Arc::new(Scripted(
            entries
                .iter()
                .map(|(e, c)| (e.to_string(), *c))
                .collect(),
        ))
    }

    fn step(action: &str, endpoint: &str) -> Step {
        Step {
            action: action.to_string(),
            request: RequestSpec::new(HttpMethod::Post, endpoint),
        }
    }

    #[tokio::test]
    async fn workflow_short_circuits_at_first_failure() {
        let case = TestCase::new("Assessment", RequestSpec::new(HttpMethod::Post, ""))
            .with_steps(vec![
                step("Start", "/start"),
                step("Answer", "/answer"),
                step("Generate", "/generate"),
            ]);
        let executor = scripted(&[("/start", 200), ("/answer", 500), ("/generate", 200)]);

        let verdict = evaluate(Category::Workflow, &case, executor).await;
        assert!(!verdict.passed);
        assert_eq!(verdict.details, "Completados 1/3 pasos");
        assert!(verdict.failure_message().contains("Answer"));
    }

    #[tokio::test]
    async fn workflow_passes_when_every_step_succeeds() {
        let case = TestCase::new("Assessment", RequestSpec::new(HttpMethod::Post, ""))
            .with_steps(vec![step("Start", "/start"), step("Answer", "/answer")]);
        let executor = scripted(&[("/start", 200), ("/answer", 201)]);

        let verdict = evaluate(Category::Workflow, &case, executor).await;
        assert!(verdict.passed);
        assert_eq!(verdict.details, "Completados 2/2 pasos");
    }

    #[tokio::test]
    async fn admin_carries_status_and_body() {
        let case = TestCase::new("Logs", RequestSpec::new(HttpMethod::Get, "/logs"));
        let verdict = evaluate(Category::Admin, &case, scripted(&[("/logs", 200)])).await;
        assert!(verdict.passed);
        assert_eq!(verdict.details, "Status 200: body");

        let verdict = evaluate(Category::Admin, &case, scripted(&[("/logs", 401)])).await;
        assert!(!verdict.passed);
        assert_eq!(verdict.failure_message(), "Status 401");
    }

    #[tokio::test]
    async fn unclassified_case_fails_without_requests() {
        let case = TestCase::new("both", RequestSpec::new(HttpMethod::Post, "/x"))
            .concurrent(2)
            .rapid_fire(2);
        let verdict = evaluate(Category::Stress, &case, scripted(&[("/x", 200)])).await;
        assert!(!verdict.passed);
        assert_eq!(verdict.failure_message(), "Caso sin regla de aceptación");
    }

    #[tokio::test]
    async fn security_transport_failure_is_not_a_pass() {
        let case = TestCase::new("XSS", RequestSpec::new(HttpMethod::Post, "/down"));
        let verdict = evaluate(Category::Security, &case, scripted(&[])).await;
        assert!(!verdict.passed);
        assert!(verdict.failure_message().starts_with("Sin respuesta"));
    }

    #[test]
    fn security_pass_details_name_what_was_blocked() {
        let cases = [
            (
                SecurityRule::ExpectRedirect,
                302,
                "Ruta protegida: acceso sin sesión bloqueado (status 302)",
            ),
            (SecurityRule::RejectKey, 403, "Clave API inválida rechazada (status 403)"),
            (SecurityRule::RejectMalicious, 400, "Entrada maliciosa rechazada (status 400)"),
        ];

        for (security, code, expected) in cases {
            let outcomes = vec![RequestOutcome::from_status(code, String::new(), 1)];
            let rule = AcceptanceRule::Security(security);
            let verdict = classify(&rule, Category::Security, "acceso", &outcomes);
            assert!(verdict.passed);
            assert_eq!(verdict.details, expected);
        }
    }

    #[test]
    fn admin_repeat_reports_failed_attempts() {
        let outcomes = vec![
            RequestOutcome::from_status(200, String::new(), 1),
            RequestOutcome::from_status(429, String::new(), 1),
            RequestOutcome::from_status(200, String::new(), 1),
        ];
        let rule = AcceptanceRule::Admin(AdminRule::Repeat(3));
        let verdict = classify(&rule, Category::Admin, "override", &outcomes);
        assert!(!verdict.passed);
        assert_eq!(verdict.details, "Intentos fallidos: 2");
    }
}

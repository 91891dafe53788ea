//! Reglas de aceptación por categoría.
//!
//! Cada caso se traduce a exactamente una regla. Un caso cuya forma no encaja
//! con ninguna regla de su categoría queda como `Unclassified` y falla siempre.

use crate::models::{Category, RequestOutcome, SecurityProbe, TestCase};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StressRule {
    Single,
    /// Todas las peticiones deben tener éxito
    Concurrent(usize),
    /// Basta con el 80 % de éxitos
    RapidFire(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityRule {
    ExpectRedirect,
    RejectKey,
    RejectMalicious,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowRule {
    Single,
    Steps(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminRule {
    Single,
    Repeat(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptanceRule {
    Stress(StressRule),
    Security(SecurityRule),
    Workflow(WorkflowRule),
    Admin(AdminRule),
    Unclassified(String),
}

/// Cómo debe lanzar el runner las peticiones de un caso
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Single,
    Concurrent(usize),
    RapidFire(usize),
    Repeat(usize),
}

impl RunMode {
    pub fn expected_outcomes(&self) -> usize {
        match self {
            RunMode::Single => 1,
            RunMode::Concurrent(n) | RunMode::RapidFire(n) | RunMode::Repeat(n) => *n,
        }
    }
}

impl AcceptanceRule {
    pub fn for_case(category: Category, case: &TestCase) -> Self {
        if case.repetition_count() > 1 {
            return AcceptanceRule::Unclassified(
                "el caso declara más de un modificador de repetición".to_string(),
            );
        }

        if !case.steps.is_empty() && category != Category::Workflow {
            return AcceptanceRule::Unclassified(format!(
                "los flujos por pasos solo son válidos en {}",
                Category::Workflow
            ));
        }

        match category {
            Category::Stress => match (case.concurrent, case.rapid_fire, case.repeat) {
                (Some(n), None, None) => AcceptanceRule::Stress(StressRule::Concurrent(n)),
                (None, Some(n), None) => AcceptanceRule::Stress(StressRule::RapidFire(n)),
                (None, None, None) => AcceptanceRule::Stress(StressRule::Single),
                _ => AcceptanceRule::Unclassified("repeat no es un modo de estrés".to_string()),
            },
            Category::Security => {
                if case.repetition_count() > 0 {
                    return AcceptanceRule::Unclassified(
                        "las sondas de seguridad son de una sola petición".to_string(),
                    );
                }
                AcceptanceRule::Security(match case.security_probe() {
                    SecurityProbe::ExpectRedirect => SecurityRule::ExpectRedirect,
                    SecurityProbe::RejectKey => SecurityRule::RejectKey,
                    SecurityProbe::RejectMalicious => SecurityRule::RejectMalicious,
                })
            }
            Category::Workflow => {
                if case.repetition_count() > 0 {
                    return AcceptanceRule::Unclassified(
                        "los flujos no admiten repetición".to_string(),
                    );
                }
                if case.steps.is_empty() {
                    AcceptanceRule::Workflow(WorkflowRule::Single)
                } else {
                    AcceptanceRule::Workflow(WorkflowRule::Steps(case.steps.len()))
                }
            }
            Category::Admin => match (case.concurrent, case.rapid_fire, case.repeat) {
                (None, None, Some(n)) => AcceptanceRule::Admin(AdminRule::Repeat(n)),
                (None, None, None) => AcceptanceRule::Admin(AdminRule::Single),
                _ => AcceptanceRule::Unclassified(
                    "las pruebas de administración solo admiten repeat".to_string(),
                ),
            },
            Category::FixFailed => AcceptanceRule::Unclassified(format!(
                "{} no es una categoría ejecutable",
                category
            )),
        }
    }

    /// Modo de ejecución para reglas que pasan por el runner
    pub fn run_mode(&self) -> Option<RunMode> {
        match self {
            AcceptanceRule::Stress(StressRule::Single)
            | AcceptanceRule::Security(_)
            | AcceptanceRule::Workflow(WorkflowRule::Single)
            | AcceptanceRule::Admin(AdminRule::Single) => Some(RunMode::Single),
            AcceptanceRule::Stress(StressRule::Concurrent(n)) => Some(RunMode::Concurrent(*n)),
            AcceptanceRule::Stress(StressRule::RapidFire(n)) => Some(RunMode::RapidFire(*n)),
            AcceptanceRule::Admin(AdminRule::Repeat(n)) => Some(RunMode::Repeat(*n)),
            AcceptanceRule::Workflow(WorkflowRule::Steps(_)) | AcceptanceRule::Unclassified(_) => {
                None
            }
        }
    }
}

/// Éxitos en un lote de resultados
pub fn success_count(outcomes: &[RequestOutcome]) -> usize {
    outcomes.iter().filter(|o| o.success).count()
}

impl StressRule {
    pub fn accepts(&self, outcomes: &[RequestOutcome]) -> bool {
        let successes = success_count(outcomes);
        match self {
            StressRule::Single => outcomes.len() == 1 && successes == 1,
            StressRule::Concurrent(n) => outcomes.len() == *n && successes == *n,
            // successes / n >= 0.8 sin pasar por coma flotante
            StressRule::RapidFire(n) => successes * 5 >= n * 4,
        }
    }
}

impl SecurityRule {
    pub fn accepts(&self, outcome: &RequestOutcome) -> bool {
        match (self, outcome.status_code) {
            (SecurityRule::ExpectRedirect, Some(code)) => matches!(code, 302 | 401 | 403),
            (SecurityRule::RejectKey, Some(code)) => code == 403,
            (SecurityRule::RejectMalicious, Some(code)) => !matches!(code, 200 | 201),
            // Sin respuesta no se puede afirmar que el ataque fue rechazado
            (_, None) => false,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            SecurityRule::ExpectRedirect => "se esperaba 302, 401 o 403",
            SecurityRule::RejectKey => "se esperaba 403 ante una clave inválida",
            SecurityRule::RejectMalicious => "la entrada maliciosa no debe devolver 200/201",
        }
    }

    /// Lo que demuestra una respuesta aceptada
    pub fn confirmed(&self) -> &'static str {
        match self {
            SecurityRule::ExpectRedirect => "Ruta protegida: acceso sin sesión bloqueado",
            SecurityRule::RejectKey => "Clave API inválida rechazada",
            SecurityRule::RejectMalicious => "Entrada maliciosa rechazada",
        }
    }
}

impl AdminRule {
    /// Índices (desde 1) de los intentos que fallaron
    pub fn failed_attempts(outcomes: &[RequestOutcome]) -> Vec<usize> {
        outcomes
            .iter()
            .enumerate()
            .filter(|(_, o)| !o.success)
            .map(|(i, _)| i + 1)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HttpMethod, RequestSpec, Step};

    fn ok() -> RequestOutcome {
        RequestOutcome::from_status(200, String::new(), 1)
    }

    fn status(code: u16) -> RequestOutcome {
        RequestOutcome::from_status(code, String::new(), 1)
    }

    fn timeout() -> RequestOutcome {
        RequestOutcome::transport_failure("operation timed out", 30_000)
    }

    fn batch(successes: usize, total: usize) -> Vec<RequestOutcome> {
        (0..total)
            .map(|i| if i < successes { ok() } else { status(429) })
            .collect()
    }

    fn case(name: &str) -> TestCase {
        TestCase::new(name, RequestSpec::new(HttpMethod::Post, "http://localhost/x"))
    }

    #[test]
    fn concurrent_requires_every_request() {
        let rule = StressRule::Concurrent(10);
        assert!(rule.accepts(&batch(10, 10)));
        assert!(!rule.accepts(&batch(9, 10)));

        let mut mixed = batch(8, 8);
        mixed.push(timeout());
        mixed.push(timeout());
        assert!(!rule.accepts(&mixed));
    }

    #[test]
    fn rapid_fire_threshold_is_exact() {
        let rule = StressRule::RapidFire(10);
        assert!(rule.accepts(&batch(8, 10)));
        assert!(!rule.accepts(&batch(7, 10)));

        // 0.8 * 7 = 5.6: seis éxitos pasan, cinco no
        let rule = StressRule::RapidFire(7);
        assert!(rule.accepts(&batch(6, 7)));
        assert!(!rule.accepts(&batch(5, 7)));

        let rule = StressRule::RapidFire(50);
        assert!(rule.accepts(&batch(40, 50)));
        assert!(!rule.accepts(&batch(39, 50)));
    }

    #[test]
    fn security_200_is_never_a_pass() {
        for rule in [
            SecurityRule::ExpectRedirect,
            SecurityRule::RejectKey,
            SecurityRule::RejectMalicious,
        ] {
            assert!(ok().success);
            assert!(!rule.accepts(&ok()), "{:?} aceptó un 200", rule);
        }
    }

    #[test]
    fn invalid_key_probe_only_accepts_403() {
        let rule = SecurityRule::RejectKey;
        assert!(rule.accepts(&status(403)));
        assert!(!rule.accepts(&status(200)));
        assert!(!rule.accepts(&status(500)));
        assert!(!rule.accepts(&status(401)));
    }

    #[test]
    fn redirect_probe_accepts_redirect_or_denial() {
        let rule = SecurityRule::ExpectRedirect;
        for code in [302, 401, 403] {
            assert!(rule.accepts(&status(code)));
        }
        assert!(!rule.accepts(&status(404)));
    }

    #[test]
    fn malicious_probe_fails_closed_without_response() {
        let rule = SecurityRule::RejectMalicious;
        assert!(rule.accepts(&status(400)));
        assert!(rule.accepts(&status(500)));
        assert!(!rule.accepts(&status(201)));
        assert!(!rule.accepts(&timeout()));
    }

    #[test]
    fn maps_cases_to_rules() {
        assert_eq!(
            AcceptanceRule::for_case(Category::Stress, &case("c").concurrent(10)),
            AcceptanceRule::Stress(StressRule::Concurrent(10))
        );
        assert_eq!(
            AcceptanceRule::for_case(Category::Stress, &case("r").rapid_fire(50)),
            AcceptanceRule::Stress(StressRule::RapidFire(50))
        );
        assert_eq!(
            AcceptanceRule::for_case(Category::Admin, &case("a").repeat(100)),
            AcceptanceRule::Admin(AdminRule::Repeat(100))
        );
        assert_eq!(
            AcceptanceRule::for_case(Category::Security, &case("s")),
            AcceptanceRule::Security(SecurityRule::RejectMalicious)
        );
    }

    #[test]
    fn ambiguous_shapes_are_unclassified() {
        let both = case("both").concurrent(5).rapid_fire(5);
        assert!(matches!(
            AcceptanceRule::for_case(Category::Stress, &both),
            AcceptanceRule::Unclassified(_)
        ));

        let steps = case("steps").with_steps(vec![Step {
            action: "start".to_string(),
            request: RequestSpec::new(HttpMethod::Post, "http://localhost/start"),
        }]);
        assert!(matches!(
            AcceptanceRule::for_case(Category::Security, &steps),
            AcceptanceRule::Unclassified(_)
        ));
        assert_eq!(
            AcceptanceRule::for_case(Category::Workflow, &steps),
            AcceptanceRule::Workflow(WorkflowRule::Steps(1))
        );

        assert!(matches!(
            AcceptanceRule::for_case(Category::Admin, &case("c").concurrent(3)),
            AcceptanceRule::Unclassified(_)
        ));
        assert!(matches!(
            AcceptanceRule::for_case(Category::FixFailed, &case("f")),
            AcceptanceRule::Unclassified(_)
        ));
    }

    #[test]
    fn failed_attempts_are_one_based() {
        let outcomes = vec![ok(), status(429), ok(), timeout()];
        assert_eq!(AdminRule::failed_attempts(&outcomes), vec![2, 4]);
    }
}

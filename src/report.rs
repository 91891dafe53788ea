//! Agregación final de una ejecución.
//!
//! `Report::build` es una función pura sobre el `RunContext`: no hace E/S y
//! toma prestados los issues y correcciones en lugar de copiarlos.

use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::error::Result;
use crate::models::{Category, FixRecord, Issue, Verdict};
use crate::tracker::RunContext;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SuccessRate {
    NoTests,
    Percent(f64),
}

impl fmt::Display for SuccessRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuccessRate::NoTests => write!(f, "sin pruebas ejecutadas"),
            SuccessRate::Percent(p) => write!(f, "{:.1}%", p),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityPosture {
    NotAssessed,
    /// Todas las pruebas de seguridad pasaron
    Excellent,
    /// Más del 80 %
    Good,
    /// 80 % o menos
    Critical,
}

impl SecurityPosture {
    pub fn assess<'a>(verdicts: impl IntoIterator<Item = &'a Verdict>) -> Self {
        let (passed, total) = verdicts
            .into_iter()
            .fold((0usize, 0usize), |(p, t), v| (p + v.passed as usize, t + 1));

        if total == 0 {
            SecurityPosture::NotAssessed
        } else if passed == total {
            SecurityPosture::Excellent
        } else if passed * 5 > total * 4 {
            SecurityPosture::Good
        } else {
            SecurityPosture::Critical
        }
    }
}

impl fmt::Display for SecurityPosture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecurityPosture::NotAssessed => write!(f, "No evaluada"),
            SecurityPosture::Excellent => {
                write!(f, "✅ Excelente - Todas las pruebas de seguridad pasaron")
            }
            SecurityPosture::Good => write!(f, "⚠️ Buena - Problemas menores de seguridad"),
            SecurityPosture::Critical => {
                write!(f, "🚨 Crítica - Múltiples vulnerabilidades encontradas")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub success_rate: SuccessRate,
}

impl Summary {
    pub fn from_verdicts(verdicts: &[Verdict]) -> Self {
        let total = verdicts.len();
        let passed = verdicts.iter().filter(|v| v.passed).count();
        let success_rate = if total == 0 {
            SuccessRate::NoTests
        } else {
            SuccessRate::Percent(passed as f64 / total as f64 * 100.0)
        };

        Summary {
            total,
            passed,
            failed: total - passed,
            success_rate,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Report<'a> {
    pub run_id: &'a str,
    pub generated_at: DateTime<Local>,
    pub summary: Summary,
    pub by_category: BTreeMap<Category, Vec<&'a Verdict>>,
    pub issues: &'a [Issue],
    pub fixes: &'a [FixRecord],
    pub average_duration_ms: Option<f64>,
    pub most_common_failure: Option<&'a str>,
    pub security: SecurityPosture,
}

impl<'a> Report<'a> {
    pub fn build(ctx: &'a RunContext) -> Self {
        let mut by_category: BTreeMap<Category, Vec<&Verdict>> = Category::RUNNABLE
            .iter()
            .map(|c| (*c, Vec::new()))
            .collect();
        for verdict in &ctx.verdicts {
            by_category.entry(verdict.category).or_default().push(verdict);
        }

        Report {
            run_id: &ctx.run_id,
            generated_at: Local::now(),
            summary: Summary::from_verdicts(&ctx.verdicts),
            by_category,
            issues: &ctx.issues,
            fixes: &ctx.fixes,
            average_duration_ms: average_duration(&ctx.verdicts),
            most_common_failure: most_common_failure(&ctx.verdicts),
            security: SecurityPosture::assess(ctx.verdicts_for(Category::Security)),
        }
    }
}

pub fn average_duration(verdicts: &[Verdict]) -> Option<f64> {
    if verdicts.is_empty() {
        return None;
    }
    let total: f64 = verdicts.iter().map(|v| v.duration_ms).sum();
    Some(total / verdicts.len() as f64)
}

/// Mensaje de fallo más repetido; en caso de empate gana el primero visto
pub fn most_common_failure(verdicts: &[Verdict]) -> Option<&str> {
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for verdict in verdicts.iter().filter(|v| !v.passed) {
        let message = verdict.failure_message();
        match counts.iter_mut().find(|(m, _)| *m == message) {
            Some((_, count)) => *count += 1,
            None => counts.push((message, 1)),
        }
    }

    // max_by_key devuelve el último máximo; se recorre al revés para quedarse con el primero
    counts
        .into_iter()
        .rev()
        .max_by_key(|(_, count)| *count)
        .map(|(message, _)| message)
}

/// Destino duradero del informe final
pub trait ReportSink {
    /// Guarda el informe y devuelve las rutas escritas
    fn store(&self, report: &Report<'_>) -> Result<Vec<PathBuf>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pass(category: Category, ms: f64) -> Verdict {
        Verdict::pass("ok", category, "").with_duration(ms)
    }

    fn fail(category: Category, error: &str) -> Verdict {
        Verdict::fail("ko", category, error, "").with_duration(10.0)
    }

    #[test]
    fn zero_tests_yield_no_tests_state() {
        let ctx = RunContext::new();
        let report = Report::build(&ctx);
        assert_eq!(report.summary.success_rate, SuccessRate::NoTests);
        assert_eq!(report.summary.total, 0);
        assert_eq!(report.average_duration_ms, None);
        assert_eq!(report.most_common_failure, None);
        assert_eq!(report.security, SecurityPosture::NotAssessed);
    }

    #[test]
    fn summary_and_average() {
        let mut ctx = RunContext::new();
        ctx.record_verdict(pass(Category::Stress, 100.0));
        ctx.record_verdict(pass(Category::Admin, 200.0));
        ctx.record_verdict(fail(Category::Workflow, "timeout"));
        ctx.record_verdict(pass(Category::Security, 50.0));

        let report = Report::build(&ctx);
        assert_eq!(report.summary.total, 4);
        assert_eq!(report.summary.passed, 3);
        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.summary.success_rate, SuccessRate::Percent(75.0));
        assert_eq!(report.average_duration_ms, Some(90.0));
        assert_eq!(report.by_category[&Category::Stress].len(), 1);
        assert_eq!(report.by_category[&Category::Workflow].len(), 1);
    }

    #[test]
    fn most_common_failure_breaks_ties_by_first_seen() {
        let verdicts = vec![
            fail(Category::Stress, "timeout"),
            fail(Category::Admin, "Status 500"),
            fail(Category::Admin, "Status 500"),
            fail(Category::Stress, "timeout"),
            pass(Category::Stress, 1.0),
        ];
        assert_eq!(most_common_failure(&verdicts), Some("timeout"));

        let verdicts = vec![
            fail(Category::Stress, "a"),
            fail(Category::Stress, "b"),
            fail(Category::Stress, "b"),
        ];
        assert_eq!(most_common_failure(&verdicts), Some("b"));
    }

    #[test]
    fn security_posture_tiers() {
        let all = [pass(Category::Security, 1.0), pass(Category::Security, 1.0)];
        assert_eq!(SecurityPosture::assess(&all), SecurityPosture::Excellent);

        // 5 de 6 = 83 %
        let mut good: Vec<Verdict> = (0..5).map(|_| pass(Category::Security, 1.0)).collect();
        good.push(fail(Category::Security, "x"));
        assert_eq!(SecurityPosture::assess(&good), SecurityPosture::Good);

        // 4 de 5 = 80 % exacto: crítica
        let mut edge: Vec<Verdict> = (0..4).map(|_| pass(Category::Security, 1.0)).collect();
        edge.push(fail(Category::Security, "x"));
        assert_eq!(SecurityPosture::assess(&edge), SecurityPosture::Critical);
    }

    #[test]
    fn security_posture_ignores_other_categories() {
        let mut ctx = RunContext::new();
        ctx.record_verdict(fail(Category::Stress, "timeout"));
        ctx.record_verdict(pass(Category::Security, 1.0));
        assert_eq!(Report::build(&ctx).security, SecurityPosture::Excellent);
    }
}

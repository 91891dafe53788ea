use chrono::Local;
use colored::*;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::engine::{evaluate, Executor};
use crate::models::{Category, FixRecord, Issue, IssueStatus, Suite, Verdict};
use crate::tracker::{FixStore, IssueSink, RunContext};
use crate::utils::advisor::{placeholder, RemediationAdvisor};

/// Resultado de una ronda de revisión de correcciones
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PollSummary {
    /// Issues revisados (abiertos o con corrección propuesta)
    pub checked: usize,
    /// Sin corrección todavía
    pub pending: Vec<String>,
    pub fixed: Vec<String>,
    /// (issue original, nuevo issue FIX_FAILED)
    pub reopened: Vec<(String, String)>,
    /// Hay corrección pero no se pudo repetir la prueba: (issue, motivo)
    pub unresolved: Vec<(String, String)>,
}

/// Crea issues, pide sugerencias y repite pruebas cuando llega una corrección
pub struct IssueTracker {
    sink: Box<dyn IssueSink>,
    fixes: Box<dyn FixStore>,
    advisor: Arc<dyn RemediationAdvisor>,
}

impl IssueTracker {
    pub fn new(
        sink: Box<dyn IssueSink>,
        fixes: Box<dyn FixStore>,
        advisor: Arc<dyn RemediationAdvisor>,
    ) -> Self {
        IssueTracker {
            sink,
            fixes,
            advisor,
        }
    }

    /// Registra un veredicto fallido como issue y devuelve su id.
    ///
    /// Nunca falla: si el asesor no responde se guarda un texto de reemplazo y
    /// si el registro no se puede escribir el issue sigue vivo en memoria.
    pub async fn create_issue(
        &self,
        ctx: &mut RunContext,
        category: Category,
        verdict: &Verdict,
    ) -> String {
        self.open_issue(ctx, category, verdict, None).await
    }

    async fn open_issue(
        &self,
        ctx: &mut RunContext,
        category: Category,
        verdict: &Verdict,
        parent_id: Option<String>,
    ) -> String {
        let now = Local::now();
        let id = ctx.next_issue_id(category, now);
        let mut issue = Issue::from_verdict(id.clone(), category, verdict, &ctx.run_id, now);
        issue.parent_id = parent_id;

        match self.advisor.suggest(&issue).await {
            Ok(suggestion) => {
                issue.suggested_fix = Some(suggestion);
                issue.status = IssueStatus::FixProposed;
            }
            Err(e) => {
                warn!(issue_id = %id, error = %e, "sin sugerencia del asesor");
                issue.suggested_fix = Some(placeholder(&e));
            }
        }

        if let Err(e) = self.sink.create(&issue) {
            error!(issue_id = %id, error = %e, "no se pudo guardar el issue");
        }

        println!(
            "{}",
            format!("🚨 Issue creado: {} - {}", id, issue.test_name).red()
        );
        info!(issue_id = %id, severity = %issue.severity, status = ?issue.status, "issue creado");

        ctx.issues.push(issue);
        id
    }

    /// Revisa el almacén de correcciones para cada issue pendiente y repite su prueba.
    ///
    /// Los issues FIXED o REOPENED no se vuelven a revisar.
    pub async fn poll_fixes(
        &self,
        ctx: &mut RunContext,
        suite: &Suite,
        executor: Arc<dyn Executor>,
    ) -> PollSummary {
        let mut summary = PollSummary::default();
        let candidates: Vec<String> = ctx.awaiting_fix().map(|i| i.id.clone()).collect();

        for id in candidates {
            summary.checked += 1;

            if !self.fixes.has_fix(&id) {
                summary.pending.push(id);
                continue;
            }

            let submission = match self.fixes.fetch(&id) {
                Ok(Some(submission)) => submission,
                Ok(None) => {
                    summary
                        .unresolved
                        .push((id, "la corrección desapareció del almacén".to_string()));
                    continue;
                }
                Err(e) => {
                    summary
                        .unresolved
                        .push((id, format!("corrección ilegible: {}", e)));
                    continue;
                }
            };

            let Some((test_category, test_name)) = ctx
                .issue(&id)
                .map(|i| (i.test_category, i.test_name.clone()))
            else {
                continue;
            };

            let Some(case) = suite.find(test_category, &test_name) else {
                warn!(issue_id = %id, test = %test_name, "no se encontró el caso original");
                summary.unresolved.push((
                    id,
                    format!(
                        "el caso '{}' ya no existe en la suite ({})",
                        test_name, test_category
                    ),
                ));
                continue;
            };

            println!(
                "{}",
                format!("✅ Corrección encontrada para {} - repitiendo prueba...", id).blue()
            );
            let verdict = evaluate(test_category, case, Arc::clone(&executor)).await;

            if verdict.passed {
                self.transition(ctx, &id, IssueStatus::Fixed);
                ctx.fixes.push(FixRecord {
                    issue_id: id.clone(),
                    status: IssueStatus::Fixed,
                    fix_data: submission.fix,
                    retest_passed: true,
                });
                println!("{}", format!("✅ Corrección confirmada para {}", id).green());
                summary.fixed.push(id);
            } else {
                self.transition(ctx, &id, IssueStatus::Reopened);
                println!(
                    "{}",
                    format!("❌ La corrección de {} no pasó la prueba", id).red()
                );
                let new_id = self
                    .open_issue(ctx, Category::FixFailed, &verdict, Some(id.clone()))
                    .await;
                summary.reopened.push((id, new_id));
            }
        }

        summary
    }

    fn transition(&self, ctx: &mut RunContext, id: &str, status: IssueStatus) {
        if let Some(issue) = ctx.issue_mut(id) {
            info!(issue_id = %id, from = ?issue.status, to = ?status, "transición de issue");
            issue.status = status;
            if let Err(e) = self.sink.update(issue) {
                error!(issue_id = %id, error = %e, "no se pudo actualizar el issue");
            }
        }
    }
}

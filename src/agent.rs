use colored::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

use crate::engine::{evaluate, Executor};
use crate::error::Result;
use crate::models::{Category, Suite};
use crate::tracker::{IssueTracker, PollSummary, RunContext};

/// Orquesta la suite: veredictos, issues y revisión de correcciones
pub struct Agent {
    executor: Arc<dyn Executor>,
    tracker: IssueTracker,
}

impl Agent {
    pub fn new(executor: Arc<dyn Executor>, tracker: IssueTracker) -> Self {
        Agent { executor, tracker }
    }

    /// Ejecuta las categorías pedidas en orden fijo.
    ///
    /// Solo falla antes de lanzar peticiones, si alguna categoría está vacía.
    pub async fn run_suite(
        &self,
        ctx: &mut RunContext,
        suite: &Suite,
        categories: &[Category],
    ) -> Result<()> {
        suite.require(categories)?;

        for category in Category::RUNNABLE {
            if categories.contains(&category) {
                self.run_category(ctx, suite, category).await;
            }
        }

        Ok(())
    }

    pub async fn run_category(&self, ctx: &mut RunContext, suite: &Suite, category: Category) {
        println!(
            "{}",
            format!("\nEjecutando {}...", category.title()).blue()
        );

        for case in suite.cases(category) {
            let verdict = evaluate(category, case, Arc::clone(&self.executor)).await;
            println!("{} {}", verdict.icon(), verdict.test_name);

            if !verdict.passed {
                self.tracker.create_issue(ctx, category, &verdict).await;
            }
            ctx.record_verdict(verdict);
        }
    }

    pub async fn poll_fixes(&self, ctx: &mut RunContext, suite: &Suite) -> PollSummary {
        self.tracker
            .poll_fixes(ctx, suite, Arc::clone(&self.executor))
            .await
    }

    /// Revisa correcciones cada `interval` hasta `rounds` veces o hasta que no
    /// quede nada pendiente. Devuelve el resumen de cada ronda.
    pub async fn watch(
        &self,
        ctx: &mut RunContext,
        suite: &Suite,
        rounds: usize,
        interval: Duration,
    ) -> Vec<PollSummary> {
        let mut summaries = Vec::new();

        for round in 1..=rounds {
            let summary = self.poll_fixes(ctx, suite).await;
            info!(
                round,
                checked = summary.checked,
                fixed = summary.fixed.len(),
                reopened = summary.reopened.len(),
                unresolved = summary.unresolved.len(),
                "ronda de revisión"
            );
            summaries.push(summary);

            if ctx.awaiting_fix().next().is_none() || round == rounds {
                break;
            }
            sleep(interval).await;
        }

        summaries
    }
}

use anyhow::Context;
use colored::*;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use qa_agent::config::Settings;
use qa_agent::engine::HttpExecutor;
use qa_agent::models::{Category, Suite};
use qa_agent::report::{Report, ReportSink};
use qa_agent::tracker::{IssueTracker, RunContext};
use qa_agent::utils::{
    advisor_from_settings, load_suite, DirFixStore, ExecutionsDir, JsonIssueStore,
};
use qa_agent::Agent;

use crate::commands::poll::print_poll_summary;

/// Opciones del modo de espera de correcciones
#[derive(Debug, Clone, Copy)]
pub struct WatchOptions {
    pub interval: Duration,
    pub rounds: usize,
}

/// Construye el agente real a partir de la configuración
pub fn build_agent(settings: &Settings) -> anyhow::Result<Agent> {
    let executor = HttpExecutor::new().context("no se pudo preparar el cliente HTTP")?;
    let tracker = IssueTracker::new(
        Box::new(JsonIssueStore::new(&settings.issues_dir)),
        Box::new(DirFixStore::new(&settings.fixes_dir)),
        advisor_from_settings(settings),
    );
    Ok(Agent::new(Arc::new(executor), tracker))
}

pub fn load_checked_suite(file: &Path) -> anyhow::Result<Suite> {
    let suite = load_suite(file)
        .with_context(|| format!("no se pudo cargar la suite {}", file.display()))?;
    println!(
        "{}",
        format!("Suite {} cargada: {} casos", file.display(), suite.total_cases()).blue()
    );
    Ok(suite)
}

/// Ejecuta la suite completa y guarda el informe
pub async fn run_suite(
    settings: &Settings,
    file: &Path,
    categories: &[Category],
    watch: Option<WatchOptions>,
) -> anyhow::Result<()> {
    let suite = load_checked_suite(file)?;
    let agent = build_agent(settings)?;
    let mut ctx = RunContext::new();

    if settings.api_key.is_none() {
        println!(
            "{}",
            "ADVERTENCIA: No se encontró OPENAI_API_KEY. Los issues se crearán sin sugerencia."
                .yellow()
        );
    }

    println!("{}", format!("🤖 Ejecución {} iniciada", ctx.run_id).blue());
    agent.run_suite(&mut ctx, &suite, categories).await?;

    if let Some(options) = watch {
        println!("{}", "\n👀 Esperando correcciones...".blue());
        let summaries = agent
            .watch(&mut ctx, &suite, options.rounds, options.interval)
            .await;
        for summary in &summaries {
            print_poll_summary(summary);
        }
    }

    let report = Report::build(&ctx);
    let paths = ExecutionsDir::new(&settings.executions_dir).store(&report)?;

    println!(
        "{}",
        format!(
            "\n📊 {} pruebas, {} pasaron, {} fallaron (tasa de éxito: {})",
            report.summary.total,
            report.summary.passed,
            report.summary.failed,
            report.summary.success_rate
        )
        .green()
    );
    println!("{}", format!("Issues creados: {}", ctx.issues.len()).yellow());
    for path in paths {
        println!("{}", format!("Informe guardado en {}", path.display()).green());
    }

    Ok(())
}

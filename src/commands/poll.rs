use colored::*;
use std::path::Path;

use qa_agent::config::Settings;
use qa_agent::tracker::{IssueSink, PollSummary, RunContext};
use qa_agent::utils::JsonIssueStore;

use crate::commands::run::{build_agent, load_checked_suite, WatchOptions};

/// Revisa correcciones para los issues guardados de ejecuciones anteriores
pub async fn poll_fixes(
    settings: &Settings,
    file: &Path,
    options: WatchOptions,
) -> anyhow::Result<()> {
    let suite = load_checked_suite(file)?;
    let issues = JsonIssueStore::new(&settings.issues_dir).list()?;

    let mut ctx = RunContext::resume(issues);
    let awaiting = ctx.awaiting_fix().count();

    if awaiting == 0 {
        println!("{}", "No hay issues esperando corrección.".yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!("👀 {} issues esperando corrección", awaiting).blue()
    );

    let agent = build_agent(settings)?;
    let summaries = agent
        .watch(&mut ctx, &suite, options.rounds, options.interval)
        .await;

    for summary in &summaries {
        print_poll_summary(summary);
    }

    let still_open = ctx.awaiting_fix().count();
    if still_open > 0 {
        println!(
            "{}",
            format!("{} issues siguen pendientes", still_open).yellow()
        );
    }

    Ok(())
}

pub fn print_poll_summary(summary: &PollSummary) {
    println!(
        "{}",
        format!(
            "Revisados: {} | Corregidos: {} | Reabiertos: {} | Pendientes: {}",
            summary.checked,
            summary.fixed.len(),
            summary.reopened.len(),
            summary.pending.len()
        )
        .blue()
    );

    for (original, follow_up) in &summary.reopened {
        println!(
            "{}",
            format!("🔁 {} reabierto como {}", original, follow_up).red()
        );
    }

    for (id, reason) in &summary.unresolved {
        println!(
            "{}",
            format!("⚠️ {} sin resolver: {}", id, reason).yellow()
        );
    }
}

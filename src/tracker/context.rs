use chrono::{DateTime, Local};
use uuid::Uuid;

use crate::models::{Category, FixRecord, Issue, Verdict};

/// Estado mutable de una ejecución: contadores, veredictos, issues y correcciones.
///
/// Se pasa explícitamente; dos ejecuciones nunca comparten contexto.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Local>,
    sequence: usize,
    pub verdicts: Vec<Verdict>,
    pub issues: Vec<Issue>,
    pub fixes: Vec<FixRecord>,
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RunContext {
    pub fn new() -> Self {
        let run_id = Uuid::new_v4()
            .to_string()
            .split('-')
            .next()
            .unwrap_or("run")
            .to_string();

        RunContext {
            run_id,
            started_at: Local::now(),
            sequence: 0,
            verdicts: Vec::new(),
            issues: Vec::new(),
            fixes: Vec::new(),
        }
    }

    /// Contexto para revisar correcciones de issues ya guardados
    pub fn resume(issues: Vec<Issue>) -> Self {
        RunContext {
            sequence: issues.len(),
            issues,
            ..Self::new()
        }
    }

    pub fn record_verdict(&mut self, verdict: Verdict) {
        self.verdicts.push(verdict);
    }

    pub fn verdicts_for(&self, category: Category) -> impl Iterator<Item = &Verdict> {
        self.verdicts.iter().filter(move |v| v.category == category)
    }

    /// `{CATEGORIA}_{secuencia}_{unix}_{run_id}`.
    ///
    /// La secuencia es única en toda la ejecución y el run_id distingue
    /// ejecuciones que caen en el mismo segundo.
    pub fn next_issue_id(&mut self, category: Category, now: DateTime<Local>) -> String {
        self.sequence += 1;
        format!(
            "{}_{}_{}_{}",
            category.code(),
            self.sequence,
            now.timestamp(),
            self.run_id
        )
    }

    pub fn issue(&self, id: &str) -> Option<&Issue> {
        self.issues.iter().find(|i| i.id == id)
    }

    pub fn issue_mut(&mut self, id: &str) -> Option<&mut Issue> {
        self.issues.iter_mut().find(|i| i.id == id)
    }

    /// Issues que todavía esperan una corrección
    pub fn awaiting_fix(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.status.awaiting_fix())
    }
}

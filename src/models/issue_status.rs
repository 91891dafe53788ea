use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueStatus {
    Open,
    FixProposed,
    Fixed,
    Reopened,
}

impl IssueStatus {
    /// Estados que todavía esperan una corrección externa
    pub fn awaiting_fix(&self) -> bool {
        matches!(self, IssueStatus::Open | IssueStatus::FixProposed)
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueStatus::Open => write!(f, "🚨 Abierto"),
            IssueStatus::FixProposed => write!(f, "💡 Corrección propuesta"),
            IssueStatus::Fixed => write!(f, "✅ Corregido"),
            IssueStatus::Reopened => write!(f, "🔁 Reabierto"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    High,
    Medium,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::High => write!(f, "HIGH"),
            Severity::Medium => write!(f, "MEDIUM"),
        }
    }
}

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{Category, IssueStatus, Severity, Verdict};

/// Registro duradero de un veredicto fallido
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Issue {
    pub id: String,
    pub category: Category,
    /// Categoría del caso original; se usa para el retest
    pub test_category: Category,
    pub severity: Severity,
    pub test_name: String,
    pub status: IssueStatus,
    pub error: String,
    pub details: String,
    pub timestamp: DateTime<Local>,
    pub suggested_fix: Option<String>,
    /// Issue original cuando este nace de una corrección fallida
    #[serde(default)]
    pub parent_id: Option<String>,
    pub run_id: String,
}

impl Issue {
    /// Construye un issue abierto a partir de un veredicto fallido
    pub fn from_verdict(
        id: String,
        category: Category,
        verdict: &Verdict,
        run_id: &str,
        timestamp: DateTime<Local>,
    ) -> Self {
        Issue {
            id,
            category,
            test_category: verdict.category,
            severity: severity_for(category),
            test_name: verdict.test_name.clone(),
            status: IssueStatus::Open,
            error: verdict
                .error
                .clone()
                .unwrap_or_else(|| "La prueba falló".to_string()),
            details: verdict.details.clone(),
            timestamp,
            suggested_fix: None,
            parent_id: None,
            run_id: run_id.to_string(),
        }
    }
}

pub fn severity_for(category: Category) -> Severity {
    match category {
        Category::Security => Severity::High,
        _ => Severity::Medium,
    }
}

/// Corrección publicada externamente para un issue
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FixSubmission {
    pub issue_id: String,
    pub fix: Value,
}

/// Corrección confirmada por un retest
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FixRecord {
    pub issue_id: String,
    pub status: IssueStatus,
    pub fix_data: Value,
    pub retest_passed: bool,
}

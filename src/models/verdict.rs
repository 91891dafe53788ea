use serde::{Deserialize, Serialize};
use std::fmt;

/// Categoría de prueba y de issue
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Stress,
    Security,
    Workflow,
    Admin,
    /// Solo para issues: una corrección que no pasó el retest
    FixFailed,
}

impl Category {
    /// Categorías ejecutables, en el orden en que corre la suite
    pub const RUNNABLE: [Category; 4] = [
        Category::Stress,
        Category::Security,
        Category::Workflow,
        Category::Admin,
    ];

    /// Código usado en ids de issue y archivos
    pub fn code(&self) -> &'static str {
        match self {
            Category::Stress => "STRESS_TEST",
            Category::Security => "SECURITY",
            Category::Workflow => "UX",
            Category::Admin => "ADMIN",
            Category::FixFailed => "FIX_FAILED",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Category::Stress => "Pruebas de Estrés",
            Category::Security => "Pruebas de Penetración",
            Category::Workflow => "Pruebas de Flujo (UX)",
            Category::Admin => "Pruebas de Administración",
            Category::FixFailed => "Correcciones Fallidas",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Juicio sobre una ejecución de un caso de prueba
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Verdict {
    pub test_name: String,
    pub category: Category,
    pub passed: bool,
    pub duration_ms: f64,
    pub details: String,
    pub error: Option<String>,
}

impl Verdict {
    pub fn pass(test_name: &str, category: Category, details: impl Into<String>) -> Self {
        Verdict {
            test_name: test_name.to_string(),
            category,
            passed: true,
            duration_ms: 0.0,
            details: details.into(),
            error: None,
        }
    }

    pub fn fail(
        test_name: &str,
        category: Category,
        error: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Verdict {
            test_name: test_name.to_string(),
            category,
            passed: false,
            duration_ms: 0.0,
            details: details.into(),
            error: Some(error.into()),
        }
    }

    pub fn with_duration(mut self, duration_ms: f64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Mensaje con el que se agrupan los fallos en el informe
    pub fn failure_message(&self) -> &str {
        self.error.as_deref().unwrap_or("Desconocido")
    }

    pub fn icon(&self) -> &'static str {
        if self.passed {
            "✅"
        } else {
            "❌"
        }
    }
}

//! Ciclo de vida de los issues y colaboradores de persistencia.

pub mod context;
pub mod issues;

pub use context::*;
pub use issues::*;

use crate::error::Result;
use crate::models::{FixSubmission, Issue};

/// Registro duradero de issues
pub trait IssueSink: Send + Sync {
    fn create(&self, issue: &Issue) -> Result<()>;
    fn read(&self, id: &str) -> Result<Option<Issue>>;
    fn update(&self, issue: &Issue) -> Result<()>;
    fn list(&self) -> Result<Vec<Issue>>;
}

/// Almacén externo donde aparecen las correcciones; solo lectura
pub trait FixStore: Send + Sync {
    fn has_fix(&self, issue_id: &str) -> bool;
    fn fetch(&self, issue_id: &str) -> Result<Option<FixSubmission>>;
}

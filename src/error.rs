use thiserror::Error;

use crate::models::Category;

/// Errores de configuración y de almacenamiento.
///
/// Los fallos de red nunca llegan aquí: se convierten en `RequestOutcome`.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("error de E/S: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON inválido: {0}")]
    Json(#[from] serde_json::Error),

    #[error("error de CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("no se pudo crear el cliente HTTP: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("configuración inválida: {0}")]
    Config(String),

    #[error("el caso '{test}' no tiene endpoint")]
    MissingEndpoint { test: String },

    #[error("el caso '{test}' declara una repetición de 0 peticiones")]
    InvalidRepetition { test: String },

    #[error("no hay casos de prueba configurados para la categoría {0}")]
    EmptyCategory(Category),
}

pub type Result<T> = std::result::Result<T, AgentError>;

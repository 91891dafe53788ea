use serde::{Deserialize, Serialize};

/// Resultado de una única llamada HTTP
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RequestOutcome {
    pub success: bool,
    pub status_code: Option<u16>,
    pub body: String,
    pub elapsed_ms: u64,
    pub error: Option<String>,
}

impl RequestOutcome {
    /// Respuesta recibida; solo 200 y 201 cuentan como éxito
    pub fn from_status(status_code: u16, body: String, elapsed_ms: u64) -> Self {
        RequestOutcome {
            success: matches!(status_code, 200 | 201),
            status_code: Some(status_code),
            body,
            elapsed_ms,
            error: None,
        }
    }

    /// Fallo de transporte: sin código de estado
    pub fn transport_failure(error: impl Into<String>, elapsed_ms: u64) -> Self {
        RequestOutcome {
            success: false,
            status_code: None,
            body: String::new(),
            elapsed_ms,
            error: Some(error.into()),
        }
    }

    /// Código de estado legible para los detalles
    pub fn status_label(&self) -> String {
        match self.status_code {
            Some(code) => code.to_string(),
            None => "sin respuesta".to_string(),
        }
    }
}

use async_trait::async_trait;
use reqwest::{redirect, Client};
use serde_json::json;
use std::time::Instant;
use tracing::debug;

use crate::config::{BODY_PREVIEW_CHARS, REQUEST_TIMEOUT};
use crate::error::Result;
use crate::models::{HttpMethod, RequestOutcome, RequestSpec};

/// Ejecuta una petición y devuelve siempre un resultado, nunca un error
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, request: &RequestSpec) -> RequestOutcome;
}

/// Ejecutor real sobre reqwest, con timeout fijo.
///
/// No sigue redirecciones: un 302 llega tal cual al clasificador.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: Client,
}

impl HttpExecutor {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .redirect(redirect::Policy::none())
            .build()?;
        Ok(HttpExecutor { client })
    }
}

#[async_trait]
impl Executor for HttpExecutor {
    async fn execute(&self, request: &RequestSpec) -> RequestOutcome {
        let started = Instant::now();

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.endpoint),
            HttpMethod::Post => {
                let payload = request.payload.clone().unwrap_or_else(|| json!({}));
                self.client.post(&request.endpoint).json(&payload)
            }
        };

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(endpoint = %request.endpoint, error = %e, "fallo de transporte");
                return RequestOutcome::transport_failure(e.to_string(), elapsed_ms(started));
            }
        };

        let status = response.status().as_u16();

        match response.text().await {
            Ok(text) => {
                RequestOutcome::from_status(status, truncate(&text), elapsed_ms(started))
            }
            // El cuerpo se cortó a medias: se trata igual que un fallo de transporte
            Err(e) => RequestOutcome::transport_failure(
                format!("respuesta incompleta ({}): {}", status, e),
                elapsed_ms(started),
            ),
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

fn truncate(text: &str) -> String {
    text.chars().take(BODY_PREVIEW_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_on_char_boundaries() {
        let text = "ñ".repeat(BODY_PREVIEW_CHARS + 20);
        let truncated = truncate(&text);
        assert_eq!(truncated.chars().count(), BODY_PREVIEW_CHARS);
    }

    #[tokio::test]
    async fn connection_refused_becomes_failed_outcome() {
        // Puerto reservado y cerrado: la conexión se rechaza al instante
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let executor = HttpExecutor::new().unwrap();
        let request = RequestSpec::new(HttpMethod::Get, format!("http://127.0.0.1:{}/", port));
        let outcome = executor.execute(&request).await;

        assert!(!outcome.success);
        assert_eq!(outcome.status_code, None);
        assert!(outcome.error.is_some());
    }
}

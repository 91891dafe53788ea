use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::config::{Settings, REQUEST_TIMEOUT};
use crate::models::Issue;

const MAX_TOKENS: u32 = 500;

/// Colaborador externo que redacta una sugerencia de corrección
#[async_trait]
pub trait RemediationAdvisor: Send + Sync {
    async fn suggest(&self, issue: &Issue) -> anyhow::Result<String>;
}

/// Texto que se guarda cuando no hay sugerencia disponible
pub fn placeholder(error: &anyhow::Error) -> String {
    format!("Sugerencia no disponible: {:#}", error)
}

/// Elige el asesor según la configuración: sin clave API no hay asesor
pub fn advisor_from_settings(settings: &Settings) -> Arc<dyn RemediationAdvisor> {
    match &settings.api_key {
        Some(key) => match ChatAdvisor::new(&settings.advisor_url, &settings.advisor_model, key) {
            Ok(advisor) => Arc::new(advisor),
            Err(e) => {
                warn!(error = %e, "no se pudo crear el asesor; se continúa sin sugerencias");
                Arc::new(DisabledAdvisor)
            }
        },
        None => Arc::new(DisabledAdvisor),
    }
}

/// Asesor ausente: siempre responde con error
#[derive(Debug, Default)]
pub struct DisabledAdvisor;

#[async_trait]
impl RemediationAdvisor for DisabledAdvisor {
    async fn suggest(&self, _issue: &Issue) -> anyhow::Result<String> {
        bail!("no se encontró la clave API (OPENAI_API_KEY)")
    }
}

/// Asesor sobre una API de chat compatible con OpenAI
#[derive(Debug, Clone)]
pub struct ChatAdvisor {
    client: Client,
    url: String,
    model: String,
    api_key: String,
}

impl ChatAdvisor {
    pub fn new(url: &str, model: &str, api_key: &str) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(ChatAdvisor {
            client,
            url: url.to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl RemediationAdvisor for ChatAdvisor {
    async fn suggest(&self, issue: &Issue) -> anyhow::Result<String> {
        let request_body = serde_json::json!({
            "model": self.model,
            "messages": [
                {
                    "role": "user",
                    "content": build_prompt(issue)
                }
            ],
            "max_tokens": MAX_TOKENS
        });

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .context("error al conectar con el asesor")?;

        let status = response.status();
        let json: Value = response
            .json()
            .await
            .context("respuesta del asesor ilegible")?;

        if !status.is_success() {
            let message = json
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .unwrap_or("error desconocido");
            bail!("el asesor respondió {}: {}", status, message);
        }

        extract_content(&json)
    }
}

fn build_prompt(issue: &Issue) -> String {
    format!(
        "You are a senior security engineer. A {} test failed with the following details:\n\n\
         Test: {}\nError: {}\nDetails: {}\n\n\
         Provide a specific, actionable fix suggestion including:\n\
         1. Root cause analysis\n2. Specific file(s) to modify\n3. Code changes needed\n\
         4. Security best practices to implement\n\nBe concise but detailed.",
        issue.category.code(),
        issue.test_name,
        issue.error,
        if issue.details.is_empty() {
            "N/A"
        } else {
            issue.details.as_str()
        }
    )
}

/// Saca el texto de `choices[0].message.content`
fn extract_content(json: &Value) -> anyhow::Result<String> {
    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| anyhow!("la respuesta del asesor no trae contenido"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Verdict};
    use chrono::Local;
    use serde_json::json;

    fn issue() -> Issue {
        let verdict = Verdict::fail("SQL Injection", Category::Security, "Status 200", "");
        Issue::from_verdict("id".into(), Category::Security, &verdict, "run", Local::now())
    }

    #[test]
    fn extracts_first_choice_content() {
        let json = json!({"choices": [{"message": {"content": "  Usa consultas parametrizadas \n"}}]});
        assert_eq!(extract_content(&json).unwrap(), "Usa consultas parametrizadas");
    }

    #[test]
    fn empty_or_missing_content_is_an_error() {
        assert!(extract_content(&json!({"choices": []})).is_err());
        assert!(extract_content(&json!({"choices": [{"message": {"content": " "}}]})).is_err());
    }

    #[test]
    fn prompt_mentions_test_and_error() {
        let prompt = build_prompt(&issue());
        assert!(prompt.contains("SECURITY"));
        assert!(prompt.contains("Test: SQL Injection"));
        assert!(prompt.contains("Details: N/A"));
    }

    #[tokio::test]
    async fn disabled_advisor_yields_placeholder() {
        let err = DisabledAdvisor.suggest(&issue()).await.unwrap_err();
        assert!(placeholder(&err).starts_with("Sugerencia no disponible"));
    }
}

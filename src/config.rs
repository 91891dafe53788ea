//! Configuración del agente, leída de variables de entorno.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Tiempo máximo de cada petición contra la aplicación
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Caracteres del cuerpo que se conservan en cada resultado
pub const BODY_PREVIEW_CHARS: usize = 500;

/// Pausa entre peticiones en modo ráfaga (~100 peticiones/s)
pub const RAPID_FIRE_DELAY: Duration = Duration::from_millis(10);

const DEFAULT_ADVISOR_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_ADVISOR_MODEL: &str = "gpt-4";

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: Option<String>,
    pub advisor_url: String,
    pub advisor_model: String,
    pub definitions_dir: PathBuf,
    pub issues_dir: PathBuf,
    pub fixes_dir: PathBuf,
    pub executions_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api_key: None,
            advisor_url: DEFAULT_ADVISOR_URL.to_string(),
            advisor_model: DEFAULT_ADVISOR_MODEL.to_string(),
            definitions_dir: PathBuf::from("definitions"),
            issues_dir: PathBuf::from("issues"),
            fixes_dir: PathBuf::from("fixes"),
            executions_dir: PathBuf::from("executions"),
        }
    }
}

impl Settings {
    /// Carga la configuración desde el entorno, con valores por defecto
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env`, pero con una fuente de variables inyectable
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Settings {
            api_key: non_empty("OPENAI_API_KEY"),
            advisor_url: non_empty("QA_ADVISOR_URL").unwrap_or(defaults.advisor_url),
            advisor_model: non_empty("QA_ADVISOR_MODEL").unwrap_or(defaults.advisor_model),
            definitions_dir: non_empty("QA_DEFINITIONS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.definitions_dir),
            issues_dir: non_empty("QA_ISSUES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.issues_dir),
            fixes_dir: non_empty("QA_FIXES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.fixes_dir),
            executions_dir: non_empty("QA_EXECUTIONS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.executions_dir),
        }
    }

    /// Directorios de trabajo que deben existir antes de ejecutar
    pub fn working_dirs(&self) -> [&PathBuf; 4] {
        [
            &self.definitions_dir,
            &self.issues_dir,
            &self.fixes_dir,
            &self.executions_dir,
        ]
    }
}

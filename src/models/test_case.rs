use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Método HTTP de una petición. Por defecto se usa POST.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
        }
    }
}

/// Tipo de ataque que simula una prueba de seguridad
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SecurityProbe {
    /// Ruta protegida: se espera redirección o rechazo
    ExpectRedirect,
    /// Clave de API inválida: se espera 403
    RejectKey,
    /// Inyección, XSS, CSRF: cualquier 200/201 es una vulnerabilidad
    RejectMalicious,
}

/// Una petición física: lo mínimo que necesita el ejecutor
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RequestSpec {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub payload: Option<Value>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl RequestSpec {
    pub fn new(method: HttpMethod, endpoint: impl Into<String>) -> Self {
        RequestSpec {
            endpoint: endpoint.into(),
            method,
            payload: None,
            headers: BTreeMap::new(),
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Paso de un flujo de varias etapas
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Step {
    pub action: String,
    #[serde(flatten)]
    pub request: RequestSpec,
}

/// Caso de prueba declarativo, tal como viene del archivo de suite
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TestCase {
    pub name: String,
    #[serde(flatten)]
    pub request: RequestSpec,
    #[serde(default)]
    pub concurrent: Option<usize>,
    #[serde(default, alias = "rapidFire")]
    pub rapid_fire: Option<usize>,
    #[serde(default)]
    pub repeat: Option<usize>,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub probe: Option<SecurityProbe>,
    #[serde(default)]
    pub expect_redirect: bool,
}

impl TestCase {
    pub fn new(name: impl Into<String>, request: RequestSpec) -> Self {
        TestCase {
            name: name.into(),
            request,
            concurrent: None,
            rapid_fire: None,
            repeat: None,
            steps: Vec::new(),
            probe: None,
            expect_redirect: false,
        }
    }

    pub fn concurrent(mut self, n: usize) -> Self {
        self.concurrent = Some(n);
        self
    }

    pub fn rapid_fire(mut self, n: usize) -> Self {
        self.rapid_fire = Some(n);
        self
    }

    pub fn repeat(mut self, n: usize) -> Self {
        self.repeat = Some(n);
        self
    }

    pub fn with_steps(mut self, steps: Vec<Step>) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_probe(mut self, probe: SecurityProbe) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Cantidad de modificadores de repetición declarados
    pub fn repetition_count(&self) -> usize {
        [self.concurrent, self.rapid_fire, self.repeat]
            .iter()
            .filter(|m| m.is_some())
            .count()
    }

    /// Tipo de sonda de seguridad: explícito o deducido de la forma del caso
    pub fn security_probe(&self) -> SecurityProbe {
        if let Some(probe) = self.probe {
            return probe;
        }

        if self.expect_redirect {
            SecurityProbe::ExpectRedirect
        } else if self
            .request
            .headers
            .keys()
            .any(|k| k.eq_ignore_ascii_case("x-api-key"))
        {
            SecurityProbe::RejectKey
        } else {
            SecurityProbe::RejectMalicious
        }
    }
}

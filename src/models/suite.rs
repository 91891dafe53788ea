use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{AgentError, Result};
use crate::models::{Category, RequestSpec, TestCase};

/// Suite completa: destinos con nombre y casos por categoría
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Suite {
    /// Sustituciones `{nombre}` para los endpoints
    #[serde(default)]
    pub targets: BTreeMap<String, String>,
    #[serde(default)]
    pub stress: Vec<TestCase>,
    #[serde(default)]
    pub security: Vec<TestCase>,
    #[serde(default, alias = "ux")]
    pub workflow: Vec<TestCase>,
    #[serde(default)]
    pub admin: Vec<TestCase>,
}

impl Suite {
    pub fn cases(&self, category: Category) -> &[TestCase] {
        match category {
            Category::Stress => &self.stress,
            Category::Security => &self.security,
            Category::Workflow => &self.workflow,
            Category::Admin => &self.admin,
            Category::FixFailed => &[],
        }
    }

    fn cases_mut(&mut self, category: Category) -> Option<&mut Vec<TestCase>> {
        match category {
            Category::Stress => Some(&mut self.stress),
            Category::Security => Some(&mut self.security),
            Category::Workflow => Some(&mut self.workflow),
            Category::Admin => Some(&mut self.admin),
            Category::FixFailed => None,
        }
    }

    /// Busca el caso original de un issue para repetirlo
    pub fn find(&self, category: Category, test_name: &str) -> Option<&TestCase> {
        self.cases(category).iter().find(|c| c.name == test_name)
    }

    pub fn total_cases(&self) -> usize {
        Category::RUNNABLE
            .iter()
            .map(|c| self.cases(*c).len())
            .sum()
    }

    /// Expande los destinos y valida la suite antes de ejecutar nada
    pub fn prepare(mut self) -> Result<Self> {
        let targets = self.targets.clone();

        for category in Category::RUNNABLE {
            if let Some(cases) = self.cases_mut(category) {
                for case in cases.iter_mut() {
                    expand_request(&mut case.request, &targets);
                    for step in case.steps.iter_mut() {
                        expand_request(&mut step.request, &targets);
                    }
                    validate_case(case)?;
                }
            }
        }

        Ok(self)
    }

    /// Falla si alguna categoría pedida no tiene casos
    pub fn require(&self, categories: &[Category]) -> Result<()> {
        for category in categories {
            if self.cases(*category).is_empty() {
                return Err(AgentError::EmptyCategory(*category));
            }
        }
        Ok(())
    }
}

fn expand_request(request: &mut RequestSpec, targets: &BTreeMap<String, String>) {
    for (name, base) in targets {
        let placeholder = format!("{{{}}}", name);
        if request.endpoint.contains(&placeholder) {
            request.endpoint = request
                .endpoint
                .replace(&placeholder, base.trim_end_matches('/'));
        }
    }
}

fn validate_case(case: &TestCase) -> Result<()> {
    if case.steps.is_empty() && case.request.endpoint.trim().is_empty() {
        return Err(AgentError::MissingEndpoint {
            test: case.name.clone(),
        });
    }

    if let Some(step) = case
        .steps
        .iter()
        .find(|s| s.request.endpoint.trim().is_empty())
    {
        return Err(AgentError::MissingEndpoint {
            test: format!("{} / {}", case.name, step.action),
        });
    }

    let zero = [case.concurrent, case.rapid_fire, case.repeat]
        .iter()
        .any(|m| *m == Some(0));
    if zero {
        return Err(AgentError::InvalidRepetition {
            test: case.name.clone(),
        });
    }

    Ok(())
}

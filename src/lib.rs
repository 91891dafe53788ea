//! Agente de pruebas automáticas contra una aplicación web.
//!
//! Lanza pruebas de estrés, seguridad, flujo y administración, convierte cada
//! respuesta en un veredicto, abre issues para los fallos, pide sugerencias a
//! un modelo de lenguaje y repite las pruebas cuando llega una corrección.

pub mod agent;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod report;
pub mod tracker;
pub mod utils;

pub use agent::Agent;
pub use error::{AgentError, Result};

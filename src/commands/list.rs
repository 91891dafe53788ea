use colored::*;
use std::io;

use qa_agent::config::Settings;
use qa_agent::utils::{get_definition_files, get_execution_files};

/// Lista las suites y los informes disponibles
pub fn list_files(settings: &Settings) -> io::Result<()> {
    let definition_files = get_definition_files(&settings.definitions_dir)?;
    let execution_files = get_execution_files(&settings.executions_dir)?;

    if definition_files.is_empty() && execution_files.is_empty() {
        println!("{}", "No hay suites ni informes disponibles.".yellow());
        return Ok(());
    }

    if !definition_files.is_empty() {
        println!("{}", "Suites disponibles:".green());
        for (i, file) in definition_files.iter().enumerate() {
            println!("{}: {}", i + 1, file);
        }
        println!();
    } else {
        println!("{}", "No hay suites disponibles.".yellow());
    }

    if !execution_files.is_empty() {
        println!("{}", "Informes disponibles:".green());
        for (i, file) in execution_files.iter().enumerate() {
            println!("{}: {}", i + 1, file);
        }
    } else {
        println!("{}", "No hay informes disponibles.".yellow());
    }

    Ok(())
}

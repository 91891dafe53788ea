use csv::Writer;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{AgentError, Result};
use crate::models::{Category, FixSubmission, Issue, Suite, Verdict};
use crate::report::{Report, ReportSink, SuccessRate};
use crate::tracker::{FixStore, IssueSink};

/// Carga una suite desde JSON y la valida
pub fn load_suite(file_path: &Path) -> Result<Suite> {
    if !file_path.exists() {
        return Err(AgentError::Config(format!(
            "El archivo {} no existe",
            file_path.display()
        )));
    }

    let content = fs::read_to_string(file_path)?;
    let suite: Suite = serde_json::from_str(&content)?;
    suite.prepare()
}

/// Crea los directorios de trabajo si no existen
pub fn ensure_dirs<'a>(dirs: impl IntoIterator<Item = &'a PathBuf>) -> io::Result<()> {
    for dir in dirs {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }
    }
    Ok(())
}

/// Issues guardados como `<dir>/<id>.json`
#[derive(Debug, Clone)]
pub struct JsonIssueStore {
    dir: PathBuf,
}

impl JsonIssueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonIssueStore { dir: dir.into() }
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    fn write(&self, issue: &Issue) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string_pretty(issue)?;
        fs::write(self.path_for(&issue.id), content)?;
        Ok(())
    }
}

impl IssueSink for JsonIssueStore {
    fn create(&self, issue: &Issue) -> Result<()> {
        self.write(issue)
    }

    fn read(&self, id: &str) -> Result<Option<Issue>> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn update(&self, issue: &Issue) -> Result<()> {
        self.write(issue)
    }

    fn list(&self) -> Result<Vec<Issue>> {
        let mut issues = Vec::new();

        if !self.dir.exists() {
            return Ok(issues);
        }

        for path in files_with_extension(&self.dir, "json")? {
            let content = fs::read_to_string(&path)?;
            match serde_json::from_str::<Issue>(&content) {
                Ok(issue) => issues.push(issue),
                Err(e) => warn!(path = %path.display(), error = %e, "issue ilegible, se ignora"),
            }
        }

        // Orden de creación
        issues.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(issues)
    }
}

/// Correcciones publicadas como `<dir>/<id>_FIXED.json`
#[derive(Debug, Clone)]
pub struct DirFixStore {
    dir: PathBuf,
}

impl DirFixStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirFixStore { dir: dir.into() }
    }

    fn path_for(&self, issue_id: &str) -> PathBuf {
        self.dir.join(format!("{}_FIXED.json", issue_id))
    }
}

impl FixStore for DirFixStore {
    fn has_fix(&self, issue_id: &str) -> bool {
        self.path_for(issue_id).is_file()
    }

    fn fetch(&self, issue_id: &str) -> Result<Option<FixSubmission>> {
        let path = self.path_for(issue_id);
        if !path.is_file() {
            return Ok(None);
        }
        debug!(path = %path.display(), "leyendo corrección");
        let content = fs::read_to_string(path)?;
        Ok(Some(FixSubmission {
            issue_id: issue_id.to_string(),
            fix: serde_json::from_str(&content)?,
        }))
    }
}

/// Informe final en `<dir>/test-report-<fecha>-<run>.{md,csv}`
#[derive(Debug, Clone)]
pub struct ExecutionsDir {
    dir: PathBuf,
}

impl ExecutionsDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ExecutionsDir { dir: dir.into() }
    }
}

impl ReportSink for ExecutionsDir {
    fn store(&self, report: &Report<'_>) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.dir)?;

        let timestamp = report.generated_at.format("%Y%m%d_%H%M%S");
        let name = format!("test-report-{}-{}", timestamp, report.run_id);
        let md_path = self.dir.join(format!("{}.md", name));
        let csv_path = self.dir.join(format!("{}.csv", name));

        save_to_markdown(&md_path, report)?;
        let verdicts: Vec<&Verdict> = report.by_category.values().flatten().copied().collect();
        save_to_csv(&csv_path, &verdicts)?;

        Ok(vec![md_path, csv_path])
    }
}

#[derive(Serialize)]
struct VerdictRow<'a> {
    category: Category,
    test_name: &'a str,
    passed: bool,
    duration_ms: f64,
    error: &'a str,
    details: &'a str,
}

/// Guarda los veredictos en un archivo CSV
pub fn save_to_csv(file_path: &Path, verdicts: &[&Verdict]) -> Result<()> {
    let file = File::create(file_path)?;
    let mut writer = Writer::from_writer(file);

    for verdict in verdicts {
        writer.serialize(VerdictRow {
            category: verdict.category,
            test_name: &verdict.test_name,
            passed: verdict.passed,
            duration_ms: verdict.duration_ms,
            error: verdict.error.as_deref().unwrap_or(""),
            details: &verdict.details,
        })?;
    }

    writer.flush()?;

    Ok(())
}

/// Guarda el informe en formato Markdown
pub fn save_to_markdown(file_path: &Path, report: &Report<'_>) -> io::Result<()> {
    let mut file = File::create(file_path)?;
    write_markdown(&mut file, report)
}

pub fn write_markdown<W: Write>(out: &mut W, report: &Report<'_>) -> io::Result<()> {
    let summary = &report.summary;

    // Encabezado
    writeln!(out, "# Informe de Pruebas del Agente")?;
    writeln!(
        out,
        "\nFecha de ejecución: {}",
        report.generated_at.format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(out, "Ejecución: {}\n", report.run_id)?;

    writeln!(out, "## Resumen Numérico\n")?;
    writeln!(out, "- Total de pruebas: {}", summary.total)?;
    writeln!(out, "- ✅ Pasaron: {}", summary.passed)?;
    writeln!(out, "- ❌ Fallaron: {}", summary.failed)?;
    writeln!(out, "- Tasa de éxito: {}\n", summary.success_rate)?;

    // El gráfico no tiene sentido sin pruebas
    if let SuccessRate::Percent(_) = summary.success_rate {
        writeln!(out, "## Resumen Visual\n")?;
        writeln!(out, "```mermaid")?;
        writeln!(out, "pie title Resultado de las Pruebas")?;
        if summary.passed > 0 {
            writeln!(out, "    \"✅ Pasaron\" : {}", summary.passed)?;
        }
        if summary.failed > 0 {
            writeln!(out, "    \"❌ Fallaron\" : {}", summary.failed)?;
        }
        writeln!(out, "```\n")?;
    }

    writeln!(out, "## Categorías\n")?;
    for (category, verdicts) in &report.by_category {
        writeln!(out, "### {} ({} pruebas)\n", category.title(), verdicts.len())?;
        if verdicts.is_empty() {
            writeln!(out, "No se ejecutaron pruebas\n")?;
            continue;
        }
        for verdict in verdicts {
            writeln!(out, "- {} {}", verdict.icon(), verdict.test_name)?;
        }
        writeln!(out)?;
    }

    writeln!(out, "## Issues Creados\n")?;
    if report.issues.is_empty() {
        writeln!(out, "No se crearon issues\n")?;
    } else {
        writeln!(out, "| ID | Prueba | Severidad | Estado | Error |")?;
        writeln!(out, "|----|--------|-----------|--------|-------|")?;
        for issue in report.issues {
            writeln!(
                out,
                "| {} | {} | {} | {} | {} |",
                issue.id,
                issue.test_name,
                issue.severity,
                issue.status,
                escape_cell(&issue.error)
            )?;
        }
        writeln!(out)?;
    }

    writeln!(out, "## Correcciones Confirmadas\n")?;
    if report.fixes.is_empty() {
        writeln!(out, "Ninguna corrección confirmada todavía\n")?;
    } else {
        for fix in report.fixes {
            writeln!(out, "- ✅ {}", fix.issue_id)?;
        }
        writeln!(out)?;
    }

    writeln!(out, "## Observaciones\n")?;
    match report.average_duration_ms {
        Some(ms) => writeln!(out, "- Tiempo medio por prueba: {:.0}ms", ms)?,
        None => writeln!(out, "- Tiempo medio por prueba: N/A")?,
    }
    writeln!(
        out,
        "- Fallo más común: {}",
        report.most_common_failure.unwrap_or("Ninguno")
    )?;
    writeln!(out, "- Postura de seguridad: {}", report.security)?;

    writeln!(out, "\n---")?;
    writeln!(
        out,
        "**Siguientes pasos:** revisar los issues y publicar las correcciones para que el agente repita las pruebas"
    )?;

    Ok(())
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn files_with_extension(dir: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_file() && path.extension().map_or(false, |ext| ext == extension) {
            files.push(path);
        }
    }

    Ok(files)
}

/// Obtiene la lista de suites disponibles
pub fn get_definition_files(dir: &Path) -> io::Result<Vec<String>> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
        return Ok(Vec::new());
    }

    let mut files: Vec<String> = files_with_extension(dir, "json")?
        .iter()
        .filter_map(|p| p.to_str().map(String::from))
        .collect();

    // Ordenar alfabéticamente
    files.sort();

    Ok(files)
}

/// Obtiene la lista de informes guardados, los más recientes primero
pub fn get_execution_files(dir: &Path) -> io::Result<Vec<String>> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
        return Ok(Vec::new());
    }

    let mut files: Vec<String> = files_with_extension(dir, "md")?
        .iter()
        .filter_map(|p| p.to_str().map(String::from))
        .collect();

    files.sort_by(|a, b| b.cmp(a));

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IssueStatus;
    use crate::tracker::RunContext;
    use chrono::Local;
    use tempfile::tempdir;

    fn issue(id: &str) -> Issue {
        let verdict = Verdict::fail("XSS", Category::Security, "Status 200", "<script>");
        Issue::from_verdict(id.to_string(), Category::Security, &verdict, "run", Local::now())
    }

    #[test]
    fn issue_store_roundtrip_and_update() {
        let dir = tempdir().unwrap();
        let store = JsonIssueStore::new(dir.path().join("issues"));

        let mut stored = issue("SECURITY_1_1_run");
        store.create(&stored).unwrap();
        assert_eq!(store.read("SECURITY_1_1_run").unwrap(), Some(stored.clone()));
        assert_eq!(store.read("missing").unwrap(), None);

        stored.status = IssueStatus::Fixed;
        store.update(&stored).unwrap();
        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, IssueStatus::Fixed);
    }

    #[test]
    fn list_skips_unreadable_files() {
        let dir = tempdir().unwrap();
        let store = JsonIssueStore::new(dir.path());
        store.create(&issue("A_1_1_run")).unwrap();
        fs::write(dir.path().join("basura.json"), "{no es json").unwrap();

        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn fix_store_reads_fixed_files() {
        let dir = tempdir().unwrap();
        let store = DirFixStore::new(dir.path());
        assert!(!store.has_fix("SECURITY_1_1_run"));
        assert_eq!(store.fetch("SECURITY_1_1_run").unwrap(), None);

        fs::write(
            dir.path().join("SECURITY_1_1_run_FIXED.json"),
            r#"{"summary": "sanitize input"}"#,
        )
        .unwrap();
        assert!(store.has_fix("SECURITY_1_1_run"));
        let fix = store.fetch("SECURITY_1_1_run").unwrap().unwrap();
        assert_eq!(fix.fix["summary"], "sanitize input");
    }

    #[test]
    fn unreadable_fix_is_an_error() {
        let dir = tempdir().unwrap();
        let store = DirFixStore::new(dir.path());
        fs::write(dir.path().join("X_FIXED.json"), "???").unwrap();
        assert!(store.fetch("X").is_err());
    }

    #[test]
    fn markdown_for_empty_run_has_no_chart() {
        let ctx = RunContext::new();
        let report = Report::build(&ctx);
        let mut out = Vec::new();
        write_markdown(&mut out, &report).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Tasa de éxito: sin pruebas ejecutadas"));
        assert!(!text.contains("```mermaid"));
        assert!(text.contains("Postura de seguridad: No evaluada"));
    }

    #[test]
    fn report_sink_writes_markdown_and_csv() {
        let dir = tempdir().unwrap();
        let mut ctx = RunContext::new();
        ctx.record_verdict(Verdict::pass("Large Payload", Category::Stress, "Status 200"));
        ctx.record_verdict(Verdict::fail("XSS", Category::Security, "Status 200 | eco", "x"));
        ctx.issues.push(issue("SECURITY_1_1_run"));

        let report = Report::build(&ctx);
        let paths = ExecutionsDir::new(dir.path()).store(&report).unwrap();
        assert_eq!(paths.len(), 2);

        let md = fs::read_to_string(&paths[0]).unwrap();
        assert!(md.contains("- ✅ Large Payload"));
        assert!(md.contains("- ❌ XSS"));
        assert!(md.contains("Tasa de éxito: 50.0%"));
        assert!(md.contains("| SECURITY_1_1_run | XSS | HIGH |"));

        let csv = fs::read_to_string(&paths[1]).unwrap();
        assert_eq!(csv.lines().count(), 3);
        assert!(csv.starts_with("category,test_name,passed"));
    }

    #[test]
    fn load_suite_validates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("suite.json");
        fs::write(&path, r#"{"admin": [{"name": "logs", "method": "GET"}]}"#).unwrap();
        assert!(matches!(
            load_suite(&path),
            Err(AgentError::MissingEndpoint { .. })
        ));
        assert!(matches!(
            load_suite(&dir.path().join("missing.json")),
            Err(AgentError::Config(_))
        ));
    }
}

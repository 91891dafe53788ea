mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use inquire::{Select, Text};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use qa_agent::config::Settings;
use qa_agent::models::Category;
use qa_agent::utils::{ensure_dirs, get_definition_files};

use commands::{list_files, poll_fixes, run_suite, WatchOptions};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ejecutar la suite completa y generar el informe
    Run {
        /// Ruta al archivo JSON de la suite
        #[arg(short, long)]
        file: PathBuf,

        /// Limitar la ejecución a una o varias categorías
        #[arg(short, long, value_enum)]
        category: Vec<CategoryArg>,

        /// Esperar correcciones después de la ejecución
        #[arg(short, long)]
        watch: bool,

        /// Segundos entre revisiones de correcciones
        #[arg(long, default_value_t = 30)]
        interval: u64,

        /// Número máximo de revisiones
        #[arg(long, default_value_t = 10)]
        rounds: usize,
    },
    /// Revisar correcciones de issues guardados y repetir sus pruebas
    Poll {
        /// Ruta al archivo JSON de la suite
        #[arg(short, long)]
        file: PathBuf,

        /// Segundos entre revisiones de correcciones
        #[arg(long, default_value_t = 30)]
        interval: u64,

        /// Número máximo de revisiones
        #[arg(long, default_value_t = 1)]
        rounds: usize,
    },
    /// Listar suites e informes disponibles
    List,
}

#[derive(Clone, Copy, ValueEnum)]
enum CategoryArg {
    Stress,
    Security,
    Workflow,
    Admin,
}

impl From<CategoryArg> for Category {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Stress => Category::Stress,
            CategoryArg::Security => Category::Security,
            CategoryArg::Workflow => Category::Workflow,
            CategoryArg::Admin => Category::Admin,
        }
    }
}

fn selected_categories(args: &[CategoryArg]) -> Vec<Category> {
    if args.is_empty() {
        Category::RUNNABLE.to_vec()
    } else {
        args.iter().map(|a| Category::from(*a)).collect()
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("qa_agent=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let settings = Settings::from_env();

    // Crear directorios de trabajo si no existen
    ensure_dirs(settings.working_dirs())?;

    match cli.command {
        Some(Commands::Run {
            file,
            category,
            watch,
            interval,
            rounds,
        }) => {
            let watch = watch.then_some(WatchOptions {
                interval: Duration::from_secs(interval),
                rounds,
            });
            run_suite(&settings, &file, &selected_categories(&category), watch).await?
        }
        Some(Commands::Poll {
            file,
            interval,
            rounds,
        }) => {
            let options = WatchOptions {
                interval: Duration::from_secs(interval),
                rounds,
            };
            poll_fixes(&settings, &file, options).await?
        }
        Some(Commands::List) => list_files(&settings)?,
        None => {
            // Menú interactivo si no se proporciona un comando
            let options = vec![
                "Ejecutar suite completa",
                "Revisar correcciones",
                "Listar suites e informes",
                "Salir",
            ];

            let selection = Select::new("¿Qué deseas hacer?", options).prompt();

            match selection {
                Ok("Ejecutar suite completa") => {
                    if let Some(file) = select_suite_file(&settings.definitions_dir)? {
                        run_suite(&settings, &file, &Category::RUNNABLE, None).await?
                    }
                }
                Ok("Revisar correcciones") => {
                    if let Some(file) = select_suite_file(&settings.definitions_dir)? {
                        let rounds = Text::new("Número de revisiones:")
                            .with_default("1")
                            .prompt()
                            .ok()
                            .and_then(|r| r.trim().parse::<usize>().ok())
                            .unwrap_or(1);
                        let options = WatchOptions {
                            interval: Duration::from_secs(30),
                            rounds,
                        };
                        poll_fixes(&settings, &file, options).await?
                    }
                }
                Ok("Listar suites e informes") => list_files(&settings)?,
                _ => println!("¡Hasta pronto!"),
            }
        }
    }

    Ok(())
}

/// Selecciona una suite existente del directorio de definiciones
fn select_suite_file(definitions_dir: &Path) -> anyhow::Result<Option<PathBuf>> {
    let definition_files = get_definition_files(definitions_dir)?;

    if definition_files.is_empty() {
        println!(
            "{}",
            format!("No hay suites disponibles en {}.", definitions_dir.display()).red()
        );
        return Ok(None);
    }

    let selection = Select::new("Selecciona una suite:", definition_files).prompt();

    match selection {
        Ok(file) => Ok(Some(PathBuf::from(file))),
        Err(_) => Ok(None),
    }
}

//! CLI entry point for `ddl2dao`.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use ddl2dao::error::Result;
use ddl2dao::generator::dao::synthesize_dao;
use ddl2dao::generator::entity::synthesize_entity;
use ddl2dao::generator::model::synthesize_model;
use ddl2dao::generator::{Target, DEFAULT_ERRORS_PATH, DEFAULT_RAPIDASH_PATH};
use ddl2dao::output::formatter;
use ddl2dao::output::go::GoRenderer;
use ddl2dao::schema::Tables;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "ddl2dao",
    about = "Generate entities, data-access objects and models from MySQL DDL"
)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,

    /// Root directory of the generated project
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Module path of the generated project (required by `dao` and `model`)
    #[arg(long, global = true)]
    module: Option<String>,

    /// Directory of `CREATE TABLE` files [default: <root>/sql]
    #[arg(long, global = true)]
    sql_dir: Option<PathBuf>,

    /// Output directory [default: <root>]
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Import path of the caching runtime
    #[arg(long, global = true, default_value = DEFAULT_RAPIDASH_PATH)]
    rapidash_path: String,

    /// Import path of the error-tracing library
    #[arg(long, global = true, default_value = DEFAULT_ERRORS_PATH)]
    errors_path: String,

    /// Print the synthesized descriptions as JSON instead of writing sources
    #[arg(long, global = true)]
    json: bool,

    /// Print verbose diagnostics
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Parse the DDL directory and write `schema/tables.yaml`
    Schema,
    /// Generate entity types and the structable registry
    Entity,
    /// Generate data-access objects
    Dao,
    /// Generate models
    Model,
    /// Write a Markdown summary of tables and finders
    Report,
}

/// Resolved command-line settings.
struct Config {
    mode: Mode,
    sql_dir: PathBuf,
    output_dir: PathBuf,
    json: bool,
    target: Target,
}

impl Config {
    fn resolve(cli: Cli) -> std::result::Result<Self, String> {
        let root = cli
            .root
            .ok_or_else(|| "--root is required".to_string())?;
        if matches!(cli.mode, Mode::Dao | Mode::Model) && cli.module.is_none() {
            return Err("--module is required for the dao and model modes".to_string());
        }

        let mut target = Target::new(cli.module.unwrap_or_default());
        target.rapidash_path = cli.rapidash_path;
        target.errors_path = cli.errors_path;

        Ok(Self {
            mode: cli.mode,
            sql_dir: cli.sql_dir.unwrap_or_else(|| root.join("sql")),
            output_dir: cli.output_dir.unwrap_or(root),
            json: cli.json,
            target,
        })
    }

    fn schema_dir(&self) -> PathBuf {
        self.output_dir.join(formatter::SCHEMA_DIR)
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match Config::resolve(cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            process::exit(2);
        }
    };

    if let Err(e) = run(&config) {
        eprintln!("Error: {e}");
        process::exit(2);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("ddl2dao=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ddl2dao=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(config: &Config) -> Result<()> {
    let root = config.output_dir.as_path();
    let tables = match config.mode {
        Mode::Schema => Tables::load_dir(&config.sql_dir)?,
        _ => Tables::load(&config.schema_dir())?,
    };
    let target = &config.target;

    match config.mode {
        Mode::Schema => {
            let path = formatter::write_schema(root, &tables)?;
            info!(tables = tables.len(), "wrote {}", path.display());
            Ok(())
        }
        Mode::Entity if config.json => {
            let entities: Vec<_> = tables.iter().map(synthesize_entity).collect();
            print_json(&entities)
        }
        Mode::Entity => {
            let written = formatter::write_entities(root, &tables, target, &GoRenderer)?;
            summarize("entity", root, &written);
            Ok(())
        }
        Mode::Dao if config.json => {
            let daos = tables
                .iter()
                .map(synthesize_dao)
                .collect::<std::result::Result<Vec<_>, _>>()?;
            print_json(&daos)
        }
        Mode::Dao => {
            let written = formatter::write_daos(root, &tables, target, &GoRenderer)?;
            summarize("dao", root, &written);
            Ok(())
        }
        Mode::Model if config.json => {
            let models = tables
                .iter()
                .map(synthesize_model)
                .collect::<std::result::Result<Vec<_>, _>>()?;
            print_json(&models)
        }
        Mode::Model => {
            let written = formatter::write_models(root, &tables, target, &GoRenderer)?;
            summarize("model", root, &written);
            Ok(())
        }
        Mode::Report => {
            let path = formatter::write_report(root, &tables)?;
            info!(tables = tables.len(), "wrote {}", path.display());
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

fn summarize(mode: &str, root: &Path, written: &[PathBuf]) {
    info!(
        mode,
        files = written.len(),
        "generated sources under {}",
        root.display()
    );
}

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use paramcad::config::{OutputFormat, Settings};
use paramcad::logging::init_tracing;

mod cmd;

#[derive(Parser)]
#[command(name = "paramcad")]
#[command(version, about = "Parametric piece catalog and manufacturability checks")]
pub struct Cli {
    /// Settings file (default: ./paramcad.toml, then the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Piece catalog JSON file. Overrides the settings file and CAD_CATALOG_PATH.
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List catalog pieces
    Pieces {
        /// Only pieces of this discipline
        #[arg(long)]
        discipline: Option<String>,
        /// Only pieces of this category
        #[arg(long)]
        category: Option<String>,
    },
    /// List disciplines
    Disciplines,
    /// Show the parameters and rules of a piece
    Show {
        /// Piece code
        piece: String,
    },
    /// Print the default parameters of a piece as JSON
    Defaults {
        /// Piece code
        piece: String,
    },
    /// Validate parameters against the rules of a piece
    Validate {
        /// Piece code
        piece: String,
        #[command(flatten)]
        input: ParamsInput,
        /// Output format (default from settings)
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },
    /// Print the hole and slot layout of a base plate
    Layout {
        /// Piece code
        piece: String,
        #[command(flatten)]
        input: ParamsInput,
    },
    /// Load the catalog, audit its rules and validate every piece's defaults
    CheckCatalog,
}

/// Parameter sources shared by `validate` and `layout`.
#[derive(clap::Args)]
pub struct ParamsInput {
    /// JSON object of parameter values laid over the defaults
    #[arg(long)]
    pub params: Option<PathBuf>,
    /// Single parameter assignment, e.g. --set espesor=16 (repeatable)
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub assignments: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let settings_path = Settings::locate(cli.config.as_deref());
    let settings = Settings::load_from(settings_path.as_deref())?;
    init_tracing(
        cli.json_logs || settings.logging.json,
        settings.logging.filter.as_deref(),
    );
    match &settings_path {
        Some(path) => tracing::debug!(path = %path.display(), "using settings file"),
        None => tracing::debug!("no settings file found, using defaults"),
    }

    let catalog_path = cli.catalog.or_else(|| settings.catalog.path.clone());
    let catalog = cmd::load_catalog(catalog_path.as_deref())?;

    match cli.command {
        Commands::Pieces {
            discipline,
            category,
        } => cmd::cmd_pieces(&catalog, discipline.as_deref(), category.as_deref()),
        Commands::Disciplines => cmd::cmd_disciplines(&catalog),
        Commands::Show { piece } => cmd::cmd_show(&catalog, &piece),
        Commands::Defaults { piece } => cmd::cmd_defaults(&catalog, &piece),
        Commands::Validate {
            piece,
            input,
            format,
            strict,
        } => cmd::cmd_validate(
            &catalog,
            &piece,
            &input,
            format.unwrap_or(settings.output.format),
            strict || settings.output.strict,
        ),
        Commands::Layout { piece, input } => cmd::cmd_layout(&catalog, &piece, &input),
        Commands::CheckCatalog => cmd::cmd_check_catalog(&catalog),
    }
}

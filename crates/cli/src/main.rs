// tbook: render test-item lists into merged-cell spreadsheet sheets

mod exit_codes;
mod render;
mod verify;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use testbook_config::{ConfigError, DocumentSettings};
use testbook_engine::layout::MAX_SHEET_ROWS;
use testbook_engine::{LayoutEngine, LayoutOptions, LayoutPlan, TestItem};

pub use exit_codes::*;

#[derive(Parser)]
#[command(name = "tbook")]
#[command(about = "Lay out test items as merged-cell spreadsheet rows")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that lays items out.
#[derive(Args, Debug, Clone, Default)]
pub struct LayoutArgs {
    /// Document settings (TOML)
    #[arg(long, short = 'c', env = "TBOOK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Group identifier, first part of every item ID
    #[arg(long)]
    pub group_id: Option<String>,

    /// Test-type code, middle part of every item ID
    #[arg(long)]
    pub test_type: Option<String>,

    /// First item row (1-based, as shown in the spreadsheet)
    #[arg(long)]
    pub start_row: Option<usize>,

    /// Worksheet name
    #[arg(long)]
    pub sheet_name: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Lay out items and write an XLSX workbook
    #[command(after_help = "\
Examples:
  tbook render items.json -o items.xlsx
  tbook render items.json -o items.xlsx -c settings.toml --test-type IT2-PT")]
    Render {
        /// Item list (JSON array, or object with an \"items\" array)
        items: PathBuf,

        /// Output workbook
        #[arg(long, short = 'o')]
        output: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,

        /// Print merge conflicts the layout ignored
        #[arg(long)]
        diagnostics: bool,

        /// Fail (exit 1) when the layout ignored any merge conflict
        #[arg(long)]
        strict: bool,

        /// Suppress the summary line
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Show where each item lands and which regions get merged
    Plan {
        items: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Flat preview of the laid-out rows, one column per field
    Preview {
        items: PathBuf,

        /// Preview format
        #[arg(long, short = 't', value_enum, default_value = "csv")]
        to: PreviewFormat,

        /// Output file (stdout when omitted or "-")
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Check a written workbook's merged regions against the layout
    #[command(after_help = "\
Exit codes:
  0  merges match
  6  merges differ (missing or unexpected regions are listed)")]
    Verify {
        /// Workbook written by `tbook render`
        workbook: PathBuf,

        /// Item list the workbook was rendered from
        items: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PreviewFormat {
    Csv,
    Json,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  testbook-engine ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version land here too
            return ExitCode::from(if e.use_stderr() { EXIT_USAGE } else { EXIT_SUCCESS });
        }
    };
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Render { items, output, layout, diagnostics, strict, quiet } => {
            render::cmd_render(items, output, layout, diagnostics, strict, quiet)
        }
        Commands::Plan { items, layout, json } => render::cmd_plan(items, layout, json),
        Commands::Preview { items, to, output, layout } => render::cmd_preview(items, to, output, layout),
        Commands::Verify { workbook, items, layout, json } => verify::cmd_verify(workbook, items, layout, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self { code: EXIT_PARSE, message: msg.into(), hint: None }
    }

    pub fn config(err: ConfigError) -> Self {
        let code = match &err {
            ConfigError::Io(_) => EXIT_IO,
            _ => EXIT_CONFIG,
        };
        let hint = match &err {
            ConfigError::InvalidColumn { .. } => {
                Some("column keys are field names (note, executed_on, ...) with letter spans like \"DO:DW\"".to_string())
            }
            ConfigError::InvalidStartRow(_) => Some("rows are 1-based, 1 to 1048576; the default is 5".to_string()),
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// Shared input handling
// ============================================================================

/// Settings file (or defaults) with command-line overrides applied.
pub fn resolve_settings(args: &LayoutArgs) -> Result<DocumentSettings, CliError> {
    let mut settings = match &args.config {
        Some(path) => DocumentSettings::load(path).map_err(CliError::config)?,
        None => DocumentSettings::default(),
    };
    if let Some(group_id) = &args.group_id {
        settings.group_id = group_id.clone();
    }
    if let Some(test_type) = &args.test_type {
        settings.test_type = test_type.clone();
    }
    if let Some(start_row) = args.start_row {
        settings.start_row = start_row;
    }
    if let Some(sheet_name) = &args.sheet_name {
        settings.sheet_name = sheet_name.clone();
    }
    Ok(settings)
}

pub fn resolve_options(settings: &DocumentSettings) -> Result<LayoutOptions, CliError> {
    settings.to_layout_options().map_err(CliError::config)
}

/// Plan `items`, refusing layouts that run past the last worksheet row.
pub fn plan_on_sheet(engine: &LayoutEngine, items: &[TestItem]) -> Result<LayoutPlan, CliError> {
    let plan = engine.plan(items);
    if !plan.fits_sheet() {
        return Err(CliError {
            code: EXIT_CONFIG,
            message: format!(
                "{} items starting at row {} run past the last sheet row ({})",
                items.len(),
                engine.options().start_row.saturating_add(1),
                MAX_SHEET_ROWS
            ),
            hint: Some("lower --start-row or split the item list".to_string()),
        });
    }
    Ok(plan)
}

pub fn read_items(path: &Path) -> Result<Vec<TestItem>, CliError> {
    if !path.exists() {
        return Err(CliError::io(format!("{}: no such file", path.display())));
    }
    let items = testbook_io::items::load_items(path).map_err(|e| {
        CliError::parse(e).with_hint("items are objects with a \"major\" key, field keys and \"steps\"/\"expected\" arrays")
    })?;
    log::info!("items: {} loaded from {}", items.len(), path.display());
    Ok(items)
}

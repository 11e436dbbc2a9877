use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use wosp_check::config::{CheckOptions, InputPaths, Schemas};
use wosp_check::diagnostics::OutputFormat;
use wosp_check::hierarchy::OrgColumns;
use wosp_check::io::{InputFormat, excel_write};
use wosp_check::membership::MembershipColumns;
use wosp_check::persons::PersonColumns;
use wosp_check::report;
use wosp_check::validate::{self, Outcome};
use wosp_check::{CheckError, Result};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging(cli.verbose) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        let code = match error {
            CheckError::StrictFailure { .. } => 2,
            _ => 1,
        };
        std::process::exit(code);
    }
}

fn init_logging(verbose: u8) -> Result<()> {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|error| CheckError::Logging(error.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Check(args) => execute_check(args),
        Command::Export(args) => execute_export(args),
    }
}

fn execute_check(args: CheckArgs) -> Result<()> {
    let options = args.input.options(args.strict);
    let outcome = check(&args.input, &options)?;

    if args.report.is_some() || args.print {
        let workbook = outcome.data.report(&outcome.diagnostics);
        if let Some(path) = &args.report {
            excel_write::write_workbook(path, &workbook)?;
            tracing::info!(path = %path.display(), "report written");
        }
        if args.print {
            report::render_text(&workbook, io::stdout().lock())?;
        }
    }

    outcome.summary.enforce(options.strict)
}

fn execute_export(args: ExportArgs) -> Result<()> {
    let options = args.input.options(false);
    let outcome = check(&args.input, &options)?;
    let format = match args.to {
        ExportFormat::Csv => InputFormat::Csv,
        ExportFormat::Xlsx => InputFormat::Excel,
    };
    validate::export(&outcome.data, &options.schemas, &args.out_dir, format)?;
    Ok(())
}

fn check(input: &InputArgs, options: &CheckOptions) -> Result<Outcome> {
    let paths = input.paths();
    validate::run_check(&paths, options, io::stderr())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Check organization, person and membership spreadsheets for consistency."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate the three input files and report diagnostics.
    Check(CheckArgs),
    /// Validate, then write the de-duplicated tables back out.
    Export(ExportArgs),
}

#[derive(clap::Args)]
struct InputArgs {
    /// Directory holding org.csv, person.csv and person2org.csv.
    #[arg(long, default_value = wosp_check::config::DEFAULT_DATA_DIR)]
    dir: PathBuf,

    /// Organization file (overrides --dir).
    #[arg(long)]
    org: Option<PathBuf>,

    /// Person file (overrides --dir).
    #[arg(long)]
    person: Option<PathBuf>,

    /// Person to organization file (overrides --dir).
    #[arg(long)]
    membership: Option<PathBuf>,

    /// Diagnostic rendering.
    #[arg(long, value_enum, default_value_t = DiagnosticFormat::Text)]
    format: DiagnosticFormat,

    #[arg(long, default_value_t = 0)]
    org_id_column: usize,
    #[arg(long, default_value_t = 1)]
    org_description_column: usize,
    #[arg(long, default_value_t = 2)]
    org_parent_column: usize,
    #[arg(long, default_value_t = 0)]
    person_id_column: usize,
    /// Column every person must fill in (e.g. e-mail).
    #[arg(long, default_value_t = 4)]
    person_field_column: usize,
    #[arg(long, default_value_t = 0)]
    membership_person_column: usize,
    #[arg(long, default_value_t = 1)]
    membership_org_column: usize,
}

#[derive(clap::Args)]
struct CheckArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Exit with status 2 when any error diagnostic is reported.
    #[arg(long)]
    strict: bool,

    /// Write organizations, persons, memberships and diagnostics to an Excel workbook.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Print the loaded tables to stdout.
    #[arg(long)]
    print: bool,
}

#[derive(clap::Args)]
struct ExportArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Directory the tables are written to.
    #[arg(long)]
    out_dir: PathBuf,

    /// Output file type.
    #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
    to: ExportFormat,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum DiagnosticFormat {
    Text,
    Json,
}

impl From<DiagnosticFormat> for OutputFormat {
    fn from(format: DiagnosticFormat) -> Self {
        match format {
            DiagnosticFormat::Text => OutputFormat::Text,
            DiagnosticFormat::Json => OutputFormat::Json,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ExportFormat {
    Csv,
    Xlsx,
}

impl InputArgs {
    fn paths(&self) -> InputPaths {
        let defaults = InputPaths::in_dir(&self.dir);
        InputPaths {
            org: self.org.clone().unwrap_or(defaults.org),
            person: self.person.clone().unwrap_or(defaults.person),
            membership: self.membership.clone().unwrap_or(defaults.membership),
        }
    }

    fn schemas(&self) -> Schemas {
        Schemas {
            org: OrgColumns {
                id: self.org_id_column,
                description: self.org_description_column,
                parent_id: self.org_parent_column,
            },
            person: PersonColumns {
                id: self.person_id_column,
                mandatory: self.person_field_column,
            },
            membership: MembershipColumns {
                person_id: self.membership_person_column,
                org_id: self.membership_org_column,
            },
        }
    }

    fn options(&self, strict: bool) -> CheckOptions {
        CheckOptions {
            schemas: self.schemas(),
            strict,
            format: self.format.into(),
        }
    }
}

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use pdf_to_excel::{
    ConversionReport, ConvertOptions, OutputFormat, convert_pdf_to_workbook, count_pdf_pages,
    validate_page_selection,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "pdf2xlsx",
    version,
    about = "Extract tables from text PDFs into spreadsheet workbooks"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract tables and write one sheet per table.
    Convert(ConvertArgs),
    /// Print the number of pages in a PDF.
    PageCount(PageCountArgs),
    /// Check a page selection against a PDF without extracting anything.
    CheckPages(CheckPagesArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Xlsx,
    Csv,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Xlsx => Self::Xlsx,
            FormatArg::Csv => Self::Csv,
        }
    }
}

#[derive(Debug, Args)]
struct ConvertArgs {
    /// Input PDF path.
    #[arg(short, long)]
    input: PathBuf,

    /// Output workbook path, or output directory with --format csv.
    #[arg(short, long)]
    output: PathBuf,

    /// Page selection like 1,3-5,7 or all.
    #[arg(long, alias = "page-selection")]
    pages: Option<String>,

    /// Output format.
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Field delimiter for CSV output.
    #[arg(long)]
    delimiter: Option<char>,

    /// Reject the whole run when any page token is invalid for this PDF.
    #[arg(long)]
    strict_pages: bool,

    /// Also write the text of table-less pages when tables were found.
    #[arg(long)]
    keep_text_pages: bool,

    /// JSON object with conversion options; explicit flags take precedence.
    #[arg(long)]
    options: Option<String>,

    /// Write the conversion report as JSON to this path.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Enable verbose logging and warning output.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct PageCountArgs {
    /// Input PDF path.
    #[arg(short, long)]
    input: PathBuf,
}

#[derive(Debug, Args)]
struct CheckPagesArgs {
    /// Input PDF path.
    #[arg(short, long)]
    input: PathBuf,

    /// Page selection like 1,3-5,7 or all.
    #[arg(long, alias = "page-selection")]
    pages: String,
}

fn parse_options(args: &ConvertArgs) -> Result<ConvertOptions> {
    let mut options = match args.options.as_deref() {
        Some(json) => ConvertOptions::from_json(json).context("failed to parse --options")?,
        None => ConvertOptions::default(),
    };

    if let Some(pages) = &args.pages {
        options.pages = Some(pages.clone());
    }
    if let Some(format) = args.format {
        options.format = format.into();
    }
    if let Some(delimiter) = args.delimiter {
        options.delimiter = delimiter;
    }
    options.strict_pages |= args.strict_pages;
    options.keep_text_pages |= args.keep_text_pages;

    options.validate().context("invalid conversion options")?;
    Ok(options)
}

fn log_report(report: &ConversionReport, verbose: bool) {
    if report.warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} issue(s) detected", report.warnings.len());
    if verbose {
        for warning in &report.warnings {
            eprintln!(
                "  - {:?} page={:?} strategy={:?}: {}",
                warning.code, warning.page, warning.strategy, warning.message
            );
        }
    }
}

fn run_convert(args: &ConvertArgs) -> Result<ConversionReport> {
    let options = parse_options(args)?;
    let report = convert_pdf_to_workbook(&args.input, &args.output, &options)
        .with_context(|| format!("failed to convert '{}'", args.input.display()))?;

    if let Some(path) = &args.report {
        std::fs::write(path, report.to_json()?)
            .with_context(|| format!("failed to write report '{}'", path.display()))?;
    }
    Ok(report)
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "pdf_to_excel=info"
    } else {
        "pdf_to_excel=warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbose = matches!(&cli.command, Commands::Convert(args) if args.verbose);
    init_tracing(verbose);

    match cli.command {
        Commands::Convert(args) => match run_convert(&args) {
            Ok(report) => {
                log_report(&report, args.verbose);
                for sheet in &report.sheets {
                    println!("{} ({} rows)", sheet.name, sheet.rows);
                }
                if report.has_tables() {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::from(2)
                }
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::from(1)
            }
        },
        Commands::PageCount(args) => match count_pdf_pages(&args.input) {
            Ok(0) => {
                println!("0");
                ExitCode::from(1)
            }
            Ok(count) => {
                println!("{count}");
                ExitCode::SUCCESS
            }
            Err(error) => {
                eprintln!("error: {error}");
                ExitCode::from(1)
            }
        },
        Commands::CheckPages(args) => match validate_page_selection(&args.input, &args.pages) {
            Ok(selection) => {
                println!("{selection}");
                ExitCode::SUCCESS
            }
            Err(error) => {
                eprintln!("error: {error}");
                ExitCode::from(1)
            }
        },
    }
}

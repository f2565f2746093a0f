use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use miette::{IntoDiagnostic, Result, WrapErr};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use specscope::baseline::Baseline;
use specscope::discovery::{FileFinder, Origin, SpecFile};
use specscope::report::{ReportFormat, Reporter};
use specscope::spec::SpecError;
use specscope::watch::FileWatcher;
use specscope::{AnalysisEngine, AnalysisReport, Config, Severity, SpecDocument};

/// specscope - Static analysis for OpenAPI specifications
#[derive(Parser, Debug, Clone)]
#[command(name = "specscope")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Spec file, or directory to scan for spec files
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Target files or directories to analyze (can be specified multiple times)
    #[arg(short, long)]
    target: Vec<PathBuf>,

    /// Patterns to exclude (can be specified multiple times)
    #[arg(short, long)]
    exclude: Vec<String>,

    /// Schema name patterns never reported as unused, similar or cyclic
    #[arg(long, value_name = "PATTERN")]
    ignore_schema: Vec<String>,

    /// Output format (defaults to the configured format)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Output file (for json/sarif formats)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Minimum severity to report (info, warning, error)
    #[arg(long, default_value = "info")]
    min_severity: String,

    /// Report operations nested deeper than this
    #[arg(long, value_name = "DEPTH")]
    max_depth: Option<usize>,

    /// Print the authorization matrix
    #[arg(long)]
    matrix: bool,

    /// Print the nesting depth of every operation
    #[arg(long)]
    depths: bool,

    /// Run analyzers in parallel
    #[arg(long)]
    parallel: bool,

    /// Baseline file for ignoring existing issues
    /// New issues not in baseline will be reported
    #[arg(long, value_name = "FILE")]
    baseline: Option<PathBuf>,

    /// Generate a baseline file from current results
    #[arg(long, value_name = "FILE")]
    generate_baseline: Option<PathBuf>,

    /// Watch mode - re-run when a spec file changes
    #[arg(long)]
    watch: bool,

    /// Exit with status 1 when any finding is reported
    #[arg(long)]
    fail_on_findings: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only output results
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum OutputFormat {
    Terminal,
    Json,
    Sarif,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Terminal => ReportFormat::Terminal,
            OutputFormat::Json => ReportFormat::Json,
            OutputFormat::Sarif => ReportFormat::Sarif,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    info!("specscope v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;

    if cli.watch {
        return run_watch_mode(config, cli);
    }

    let remaining = run_analysis(&config, &cli)?;
    if cli.fail_on_findings && remaining > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn run_watch_mode(config: Config, cli: Cli) -> Result<()> {
    let ignored: Vec<PathBuf> = cli
        .output
        .iter()
        .chain(cli.generate_baseline.iter())
        .chain(cli.baseline.iter())
        .cloned()
        .collect();

    let watcher = FileWatcher::new().with_ignored_files(ignored);
    let path = cli.path.clone();

    watcher
        .watch(&path, move || {
            match run_analysis(&config, &cli) {
                Ok(_) => {
                    println!();
                    println!("{}", "✓ Analysis complete. Waiting for changes...".green());
                }
                Err(e) => {
                    eprintln!("{}: {:?}", "Analysis error".red(), e);
                }
            }
            true
        })
        .map_err(|e| miette::miette!("Watch error: {}", e))?;

    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // stdout carries JSON/SARIF output
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Directory holding the project config and anchoring baseline paths
fn project_root(path: &Path) -> PathBuf {
    if path.is_file() {
        path.parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    } else {
        path.to_path_buf()
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        Config::from_default_locations(&project_root(&cli.path))?
    };

    if !cli.target.is_empty() {
        config.targets = cli.target.clone();
    }
    if !cli.exclude.is_empty() {
        config.exclude.extend(cli.exclude.clone());
    }
    if !cli.ignore_schema.is_empty() {
        config.ignore_schemas.extend(cli.ignore_schema.clone());
    }
    if let Some(max_depth) = cli.max_depth {
        config.detection.max_depth = max_depth;
    }
    if cli.parallel {
        config.parallel = true;
    }
    if cli.matrix {
        config.report.show_matrix = true;
    }
    if cli.depths {
        config.report.show_depths = true;
    }

    Ok(config)
}

fn report_format(config: &Config, cli: &Cli) -> Result<ReportFormat> {
    match &cli.format {
        Some(format) => Ok(format.clone().into()),
        None => ReportFormat::parse(&config.report.format).ok_or_else(|| {
            miette::miette!(
                "Unknown report format '{}' (expected terminal, json or sarif)",
                config.report.format
            )
        }),
    }
}

/// Parse every file, skipping discovered files that are not OpenAPI documents.
/// A file named explicitly that fails to parse is an error.
fn load_documents(files: &[SpecFile], progress: &ProgressBar) -> Result<Vec<(PathBuf, SpecDocument)>> {
    let loaded: Vec<(&SpecFile, std::result::Result<SpecDocument, SpecError>)> = files
        .par_iter()
        .map(|file| {
            let result = file.load();
            progress.inc(1);
            (file, result)
        })
        .collect();

    let mut documents = Vec::new();
    for (file, result) in loaded {
        match result {
            Ok(doc) => documents.push((file.path.clone(), doc)),
            Err(SpecError::NotOpenApi(path)) => debug!("Skipping non-OpenAPI file: {}", path),
            Err(e) if file.origin == Origin::Explicit => {
                return Err(e)
                    .into_diagnostic()
                    .wrap_err_with(|| format!("Failed to load {}", file.path.display()));
            }
            Err(e) => warn!("Skipping {}: {}", file.path.display(), e),
        }
    }

    Ok(documents)
}

/// Run one analysis pass, returning the number of findings reported
fn run_analysis(config: &Config, cli: &Cli) -> Result<usize> {
    let start_time = Instant::now();
    let root = project_root(&cli.path);
    let format = report_format(config, cli)?;
    let terminal = matches!(format, ReportFormat::Terminal);
    let chatty = terminal && !cli.quiet;

    let min_severity = Severity::parse(&cli.min_severity).ok_or_else(|| {
        miette::miette!(
            "Unknown severity '{}' (expected info, warning or error)",
            cli.min_severity
        )
    })?;

    if !cli.path.exists() {
        return Err(miette::miette!("Path does not exist: {}", cli.path.display()));
    }

    // Step 1: Discover files
    info!("Discovering spec files...");
    let files = FileFinder::new(config).find_files(&cli.path);
    info!("Found {} candidate files", files.len());

    if files.is_empty() {
        if chatty {
            println!("{}", "No OpenAPI specification files found.".yellow());
        }
        return Ok(0);
    }

    // Step 2: Load documents
    let progress = if chatty && files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                .into_diagnostic()?
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let documents = load_documents(&files, &progress)?;
    progress.finish_and_clear();

    if documents.is_empty() {
        if chatty {
            println!("{}", "No OpenAPI specification files found.".yellow());
        }
        return Ok(0);
    }

    // Step 3: Analyze
    info!("Analyzing {} documents...", documents.len());
    let engine = AnalysisEngine::from_config(config);
    let analyze = |(path, doc): &(PathBuf, SpecDocument)| engine.analyze(doc).with_source(path.clone());
    let mut reports: Vec<AnalysisReport> = if config.parallel {
        documents.par_iter().map(analyze).collect()
    } else {
        documents.iter().map(analyze).collect()
    };

    for report in &mut reports {
        report.findings.retain(|f| f.severity >= min_severity);
    }

    // Step 4: Baselines
    if let Some(path) = &cli.generate_baseline {
        Baseline::from_reports(&reports, &root)
            .save(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to write baseline {}", path.display()))?;
        if !cli.quiet {
            eprintln!("{}", format!("Baseline written to: {}", path.display()).green());
        }
    }

    if let Some(path) = &cli.baseline {
        let baseline = Baseline::load(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to load baseline {}", path.display()))?;
        let stats = baseline.stats(&reports, &root);
        if chatty {
            println!("{}", format!("Baseline: {}", stats).cyan());
        }
        for report in &mut reports {
            baseline.filter_report(report, &root);
        }
    }

    // Step 5: Report
    let reporter = Reporter::new(format, cli.output.clone())
        .with_matrix(config.report.show_matrix)
        .with_depths(config.report.show_depths);
    reporter.report(&reports)?;

    if chatty {
        let elapsed = start_time.elapsed();
        println!(
            "{}",
            format!("Analyzed {} specs in {:.2}s", reports.len(), elapsed.as_secs_f64()).dimmed()
        );
    }

    Ok(reports.iter().map(|r| r.findings.len()).sum())
}

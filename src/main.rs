use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use gradebook::batch::{BatchOptions, ReportMode};
use gradebook::error::BatchError;
use gradebook::output::OutputFormat;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_FAILURE: i32 = 1;
const EXIT_MAPPING: i32 = 2;
const EXIT_ROW: i32 = 3;
const EXIT_CONFIG: i32 = 4;
const EXIT_GRADE: i32 = 5;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Grade one or more datasets and write the report
    Grade {
        /// Dataset CSV files or glob patterns
        #[arg(short, long = "data", required = true, num_args = 1..)]
        data: Vec<String>,

        /// Config files: one for all datasets, or one per dataset in the same order
        /// (defaults to ~/.config/gradebook/grading.yaml)
        #[arg(short, long = "config", num_args = 1..)]
        config: Vec<PathBuf>,

        /// Write one report per student into the output directory
        #[arg(long)]
        per_student: bool,

        /// Output file, or directory with --per-student
        #[arg(short, long)]
        out: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,

        /// Score datasets in parallel
        #[arg(long)]
        parallel: bool,
    },
    /// Validate config files without grading anything
    Check {
        #[arg(short, long = "config", num_args = 1..)]
        config: Vec<PathBuf>,
    },
    /// Write a starter config file
    Init {
        /// Where to write it (defaults to ~/.config/gradebook/grading.yaml)
        path: Option<PathBuf>,
    },
}

#[derive(Parser, Debug)]
#[command(name = "gradebook")]
#[command(about = "Weighted grade calculator for CSV assessment data", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match cli.command {
        Commands::Grade {
            data,
            config,
            per_student,
            out,
            format,
            parallel,
        } => {
            let mode = if per_student {
                ReportMode::PerStudent
            } else {
                ReportMode::ForAll
            };
            grade(&data, config, out, format, BatchOptions { mode, parallel })
        }
        Commands::Check { config } => check(config),
        Commands::Init { path } => init(path),
    };

    std::process::exit(code);
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "gradebook=debug"
    } else {
        "gradebook=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn exit_code(err: &BatchError) -> i32 {
    match err {
        BatchError::InvalidMapping { .. } => EXIT_MAPPING,
        BatchError::Config(_) => EXIT_CONFIG,
        BatchError::Row { .. } => EXIT_ROW,
        BatchError::Grade { .. } | BatchError::Student { .. } => EXIT_GRADE,
    }
}

fn config_paths(paths: Vec<PathBuf>) -> Result<Vec<PathBuf>, i32> {
    if !paths.is_empty() {
        return Ok(paths);
    }
    match gradebook::config::get_config_path() {
        Ok(path) => Ok(vec![path]),
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            Err(EXIT_CONFIG)
        }
    }
}

fn grade(
    data: &[String],
    config: Vec<PathBuf>,
    out: Option<PathBuf>,
    format: OutputFormat,
    options: BatchOptions,
) -> i32 {
    let start_time = Instant::now();

    let config_paths = match config_paths(config) {
        Ok(paths) => paths,
        Err(code) => return code,
    };

    let data_paths = match gradebook::input::expand_inputs(data) {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("Input error: {:#}", e);
            return EXIT_FAILURE;
        }
    };

    // Fail fast on the mapping before reading any files
    if let Err(e) = gradebook::batch::pair_configs(config_paths.len(), data_paths.len()) {
        eprintln!("Error: {}", e);
        return exit_code(&e);
    }

    let mut configs = Vec::with_capacity(config_paths.len());
    for path in &config_paths {
        match gradebook::config::load_config_source(path) {
            Ok(source) => configs.push(source),
            Err(e) => {
                eprintln!("Config error: {:#}", e);
                return EXIT_CONFIG;
            }
        }
    }

    let mut datasets = Vec::with_capacity(data_paths.len());
    for path in &data_paths {
        match gradebook::input::read_dataset(path) {
            Ok(dataset) => datasets.push(dataset),
            Err(e) => {
                eprintln!("Input error: {:#}", e);
                return EXIT_FAILURE;
            }
        }
    }

    let destination = out.unwrap_or_else(|| match options.mode {
        ReportMode::ForAll => PathBuf::from(format!("report.{}", format.extension())),
        ReportMode::PerStudent => PathBuf::from("reports"),
    });

    let (model, written) = match gradebook::output::run_and_write(
        &datasets,
        &configs,
        &options,
        format,
        &destination,
        chrono::Utc::now(),
    ) {
        Ok(result) => result,
        Err(e) => match e.downcast_ref::<BatchError>() {
            Some(batch_err) => {
                eprintln!("Error: {}", batch_err);
                eprintln!("No report was written.");
                return exit_code(batch_err);
            }
            None => {
                eprintln!("Output error: {:#}", e);
                return EXIT_FAILURE;
            }
        },
    };

    let students = model.students();
    let places = match &model {
        gradebook::report::ReportModel::Combined(report) => report.settings.decimal_places,
        gradebook::report::ReportModel::PerStudent(reports) => reports
            .first()
            .map(|r| r.report.settings.decimal_places)
            .unwrap_or(2),
    };
    let use_colors = gradebook::output::should_use_colors();
    println!(
        "{}",
        gradebook::output::format_summary(&students, places, use_colors)
    );

    for warning in students.iter().flat_map(|s| s.warnings.iter()) {
        eprintln!("Warning: {}", warning);
    }

    if written.len() == 1 {
        println!("Report written to {}.", written[0].display());
    } else {
        println!(
            "{} reports written to {}.",
            written.len(),
            destination.display()
        );
    }

    tracing::debug!(elapsed = ?start_time.elapsed(), "done");
    EXIT_SUCCESS
}

fn check(config: Vec<PathBuf>) -> i32 {
    let paths = match config_paths(config) {
        Ok(paths) => paths,
        Err(code) => return code,
    };

    let mut code = EXIT_SUCCESS;
    for path in &paths {
        let source = match gradebook::config::load_config_source(path) {
            Ok(source) => source,
            Err(e) => {
                eprintln!("Config error: {:#}", e);
                code = EXIT_CONFIG;
                continue;
            }
        };

        match gradebook::grading::ConfigModel::from_raw(&source.name, &source.raw) {
            Ok(model) => {
                println!(
                    "ok: {} ({} components, weights sum to {}, {} grades)",
                    model.name(),
                    model.components().len(),
                    model.weight_sum(),
                    model.scale().thresholds().len()
                );
                for warning in model.warnings() {
                    eprintln!("  warning: {}", warning);
                }
            }
            Err(e) => {
                eprintln!("Config error: {}", e);
                code = EXIT_CONFIG;
            }
        }
    }
    code
}

fn init(path: Option<PathBuf>) -> i32 {
    let path = match path {
        Some(path) => path,
        None => match gradebook::config::get_config_path() {
            Ok(path) => path,
            Err(e) => {
                eprintln!("Config error: {:#}", e);
                return EXIT_CONFIG;
            }
        },
    };

    match gradebook::config::write_starter_config(&path) {
        Ok(()) => {
            println!("Config written to {}.", path.display());
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("Init error: {:#}", e);
            EXIT_FAILURE
        }
    }
}

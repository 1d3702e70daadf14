//! Command-line interface for the SALVO toolkit.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::SalvoConfig;

#[derive(Parser)]
#[command(name = "salvo")]
#[command(about = "SALVO snow and ice survey toolkit", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the log type detected in a file or directory name
    LogType {
        /// File or directory name
        name: String,
    },

    /// Print the canonical SALVO name of an emlid log
    Name {
        /// Original file or directory name
        name: String,
        /// Survey site code
        #[arg(long)]
        site: String,
        /// Survey location
        #[arg(long)]
        location: String,
        /// Sample rate in Hz, appended to the log type
        #[arg(long)]
        rate: Option<f64>,
    },

    /// Print the site and date derived from a survey directory tree
    SiteInfo {
        /// Path inside a YYYYMMDD-SITE directory
        path: PathBuf,
    },

    /// Rename emlid logs and archives to canonical names
    Rename {
        /// Directory holding the logs or archives and the survey YAML file
        directory: PathBuf,
        /// Preview changes without renaming files
        #[arg(long)]
        dry_run: bool,
    },

    /// Annotate a transect table with track distances
    Distance {
        /// Input CSV file or directory
        input_path: PathBuf,
        /// Output CSV file or directory (defaults to the next processing level)
        output_path: Option<PathBuf>,
        /// Process entire directory (batch mode)
        #[arg(long)]
        batch: bool,
        /// Limit number of files to process
        #[arg(long)]
        limit: Option<usize>,
        /// Origin for DistOrigin, comma separated (x,y[,z])
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        origin: Option<Vec<f64>>,
        /// Suffix appended to the derived column names
        #[arg(long)]
        suffix: Option<String>,
        /// Processing level of the output working directory
        #[arg(long)]
        level: Option<String>,
    },

    /// Plot an annotated transect in plan view (PNG)
    Plot {
        /// Input CSV file
        csv_file: PathBuf,
        /// Output PNG file path (defaults to same name as CSV with .png extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<62} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.chars().count() > 39 {
            format!("...{}", tail_chars(value, 36))
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<39} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

/// Last `n` characters of a string; paths are most telling at the end.
fn tail_chars(value: &str, n: usize) -> String {
    let skip = value.chars().count().saturating_sub(n);
    value.chars().skip(skip).collect()
}

fn fail(context: &str, e: impl std::fmt::Display) -> ! {
    error!("{}: {}", context, e);
    std::process::exit(1);
}

pub fn run() {
    let cli = Cli::parse();

    // Logging first so config loading can warn
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    let config = match &cli.config {
        Some(path) => match SalvoConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!("Failed to load config from {}: {}, using defaults", path.display(), e);
                SalvoConfig::default()
            }
        },
        None => SalvoConfig::default(),
    };

    match cli.command {
        Commands::LogType { name } => cmd_log_type(&name, &config),
        Commands::Name {
            name,
            site,
            location,
            rate,
        } => cmd_name(&name, &site, &location, rate, &config),
        Commands::SiteInfo { path } => cmd_site_info(&path),
        Commands::Rename { directory, dry_run } => cmd_rename(&directory, dry_run, &config),
        Commands::Distance {
            input_path,
            output_path,
            batch,
            limit,
            origin,
            suffix,
            level,
        } => {
            let mut distance = config.distance.clone();
            if origin.is_some() {
                distance.origin = origin;
            }
            if let Some(suffix) = suffix {
                distance.column_suffix = suffix;
            }
            if let Some(level) = level {
                distance.level = level;
            }
            cmd_distance(&input_path, output_path, batch, limit, &distance);
        }
        Commands::Plot { csv_file, output } => cmd_plot(&csv_file, output, &config),
    }
}

fn cmd_log_type(name: &str, config: &SalvoConfig) {
    use crate::naming;

    match naming::detect_log_type_with(name, &config.naming.log_types) {
        Some(log_type) => println!("{}", log_type),
        None => fail("Log type detection failed", format!("no log type in '{}'", name)),
    }
}

fn cmd_name(name: &str, site: &str, location: &str, rate: Option<f64>, config: &SalvoConfig) {
    use crate::naming;

    match naming::build_canonical_name_with(name, site, location, rate, &config.naming) {
        Ok(canonical) => println!("{}", canonical),
        Err(e) => fail("Naming failed", e),
    }
}

fn cmd_site_info(path: &Path) {
    use crate::naming;

    let site = naming::site_from_path(path).unwrap_or_else(|e| fail("Site lookup failed", e));
    let date = naming::date_from_path(path).unwrap_or_else(|e| fail("Date lookup failed", e));

    print_summary(
        "Survey Site",
        &[
            ("Path", path.display().to_string()),
            ("Site", site),
            ("Date", date.format("%Y-%m-%d").to_string()),
        ],
    );
}

fn cmd_rename(directory: &Path, dry_run: bool, config: &SalvoConfig) {
    use crate::processors::renaming;

    let start = Instant::now();

    if dry_run {
        println!("DRY RUN: No files will be renamed");
    }

    match renaming::rename_emlid_directory(directory, &config.naming, dry_run) {
        Ok(report) => {
            print_summary(
                "Rename Complete",
                &[
                    ("Directory", directory.display().to_string()),
                    ("Survey config", report.survey_config.display().to_string()),
                    ("Renamed", report.renamed.len().to_string()),
                    ("Archives rewritten", report.archives.len().to_string()),
                    ("Skipped", report.skipped.len().to_string()),
                    ("Dry run", dry_run.to_string()),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
        }
        Err(e) => fail("Rename failed", format!("{:#}", e)),
    }
}

fn cmd_distance(
    input_path: &Path,
    output_path: Option<PathBuf>,
    batch: bool,
    limit: Option<usize>,
    config: &crate::config::DistanceConfig,
) {
    use crate::naming;
    use crate::processors::transect;

    let start = Instant::now();

    if batch {
        let Some(output_dir) = output_path else {
            fail("Batch annotation failed", "an output directory is required in batch mode");
        };

        println!("Annotating CSV files in batch mode...");
        println!("Input directory: {}", input_path.display());
        println!("Output directory: {}", output_dir.display());
        if let Some(lim) = limit {
            println!("Processing limit: {} files", lim);
        }

        match transect::annotate_batch(input_path, &output_dir, config, limit) {
            Ok(summary) => {
                let total: f64 = summary.annotated.iter().map(|s| s.total_distance).sum();
                print_summary(
                    "Batch Annotation Complete",
                    &[
                        ("Input directory", input_path.display().to_string()),
                        ("Output directory", output_dir.display().to_string()),
                        ("Files annotated", summary.annotated.len().to_string()),
                        ("Files failed", summary.failed.len().to_string()),
                        ("Total distance", format!("{:.3}", total)),
                        ("Duration", format!("{:.2?}", start.elapsed())),
                    ],
                );
            }
            Err(e) => fail("Batch annotation failed", format!("{:#}", e)),
        }
        return;
    }

    let output = match output_path {
        Some(path) => path,
        None => naming::output_path(input_path, &config.level)
            .unwrap_or_else(|e| fail("Cannot derive output path", e)),
    };

    println!("Input: {}", input_path.display());
    println!("Output: {}", output.display());

    let spinner = create_spinner("Computing track distances...");

    match transect::annotate_csv(input_path, &output, config) {
        Ok(summary) => {
            spinner.finish_and_clear();

            print_summary(
                "Annotation Complete",
                &[
                    ("Input file", summary.input.display().to_string()),
                    ("Output file", summary.output.display().to_string()),
                    ("Points", summary.points.to_string()),
                    ("Missing points", summary.missing.to_string()),
                    ("Gaps", summary.gaps.len().to_string()),
                    ("Total distance", format!("{:.3}", summary.total_distance)),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
        }
        Err(e) => {
            spinner.finish_and_clear();
            fail("Annotation failed", format!("{:#}", e));
        }
    }
}

fn cmd_plot(csv_file: &Path, output: Option<PathBuf>, config: &SalvoConfig) {
    use crate::core::loaders::{load_point_table, CoordinateColumns};
    use crate::core::writers::DistanceColumns;
    use crate::processors::transect;
    use crate::visualization;

    let start = Instant::now();

    let output_path = output.unwrap_or_else(|| csv_file.with_extension("png"));

    println!("Input: {}", csv_file.display());
    println!("Output: {}", output_path.display());

    let spinner = create_spinner("Loading table...");

    let table = match load_point_table(csv_file, &CoordinateColumns::from(&config.distance)) {
        Ok(t) => t,
        Err(e) => {
            spinner.finish_and_clear();
            fail("Failed to load table", e);
        }
    };

    let cumulative_name = DistanceColumns::with_suffix(&config.distance.column_suffix).cumulative;
    let cumulative = match table.numeric_column(&cumulative_name) {
        Some(values) => values,
        None => {
            info!("No {} column, computing track distances", cumulative_name);
            match transect::compute_table_distances(&table, &config.distance) {
                Ok(d) => d.cumulative,
                Err(e) => {
                    spinner.finish_and_clear();
                    fail("Distance computation failed", format!("{:#}", e));
                }
            }
        }
    };

    let x: Vec<f64> = table.points.iter().map(|p| p[0]).collect();
    let y: Vec<f64> = table.points.iter().map(|p| p[1]).collect();

    spinner.set_message("Generating plot...");

    match visualization::plot_track(&output_path, &x, &y, &cumulative, &config.plot) {
        Ok(()) => {
            spinner.finish_and_clear();

            print_summary(
                "Plot Complete",
                &[
                    ("Input file", csv_file.display().to_string()),
                    ("Output PNG", output_path.display().to_string()),
                    ("Points", table.len().to_string()),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
        }
        Err(e) => {
            spinner.finish_and_clear();
            fail("Visualization failed", e);
        }
    }
}

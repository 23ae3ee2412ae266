use batch_augment::chain;
use batch_augment::config::{self, RunConfig, SETTINGS_FILE_NAME};
use batch_augment::imaging::Quality;
use batch_augment::output;
use batch_augment::process::{self, RunOptions};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "batch-augment")]
#[command(about = "Apply chains of image transformations to a directory of images")]
#[command(long_about = "\
Apply chains of image transformations to a directory of images

Each non-empty line of the chain configuration is one chain. Operations on a
line are separated by `;` and applied left to right:

  rotate 90 ; flip vertical
  tint red20 blue-10
  rotate_keep_corners 30 ; blur 5
  noise 0.8 1.2

Every (image, chain) pair produces one file named after the source, the chain
and a run-wide index:

  cat.png + `rotate 90 ; flip vertical` → Output/cat_rotate-90---flip-vertical_0.png

Operations: tint, abs_tint, rotate, rotate_keep_size, rotate_keep_corners,
rotate_crop_inward, rescale, blur, noise, brighten, flip (alias mirror).

An existing output directory is never overwritten: it is moved to
<name>_<k> first.

Run 'batch-augment gen-config' to generate a documented augment.toml.")]
#[command(version)]
struct Cli {
    /// Log debug diagnostics (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Augment every image of a directory
    Run(RunArgs),
    /// Resolve a chain configuration without processing images
    Check {
        /// Chain configuration file
        #[arg(long)]
        config_file: PathBuf,
    },
    /// Print a stock augment.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Directory holding the source images
    #[arg(long)]
    input_dir: PathBuf,

    /// Chain configuration file
    #[arg(long)]
    config_file: PathBuf,

    /// Output directory (overrides `output_dir` from settings)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Settings file [default: augment.toml next to the chain configuration]
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Maximum parallel workers (overrides `processing.max_processes`)
    #[arg(long)]
    jobs: Option<usize>,

    /// Seed for noise (overrides `processing.seed`)
    #[arg(long)]
    seed: Option<u64>,

    /// Write the run report as JSON to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Run(args) => run(args)?,
        Command::Check { config_file } => {
            let configuration = chain::load(&config_file)?;
            output::print_check_output(&configuration);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let settings_path = args
        .settings
        .clone()
        .unwrap_or_else(|| default_settings_path(&args.config_file));
    let settings = apply_overrides(config::load_config(&settings_path)?, &args)?;
    init_thread_pool(&settings.processing);

    let configuration = chain::load_or_empty(&args.config_file);
    let options = RunOptions {
        jpeg_quality: Quality::new(settings.encoding.jpeg_quality),
        seed: settings.processing.seed,
        ..RunOptions::new(&args.input_dir, &settings.output_dir)
    };

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_process_event(&event) {
                println!("{}", line);
            }
        }
    });
    let result = process::process(&options, &configuration, Some(tx));
    printer
        .join()
        .map_err(|_| "progress printer thread panicked")?;
    let report = result?;

    output::print_summary(&report);
    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)?;
    }
    Ok(())
}

/// `augment.toml` in the chain configuration's directory.
fn default_settings_path(config_file: &Path) -> PathBuf {
    config_file
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(SETTINGS_FILE_NAME)
}

/// Command-line flags win over the settings file.
fn apply_overrides(
    mut settings: RunConfig,
    args: &RunArgs,
) -> Result<RunConfig, config::ConfigError> {
    if let Some(output) = &args.output {
        settings.output_dir = output.to_string_lossy().into_owned();
    }
    if let Some(jobs) = args.jobs {
        settings.processing.max_processes = Some(jobs);
    }
    if let Some(seed) = args.seed {
        settings.processing.seed = Some(seed);
    }
    settings.validate()?;
    Ok(settings)
}

/// Diagnostics go to stderr so stdout carries only progress lines.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

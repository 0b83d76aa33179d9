use clap::{Parser, Subcommand};
use sitedata::config::{self, BuildConfig, ConfigError};
use sitedata::output;
use sitedata::pipeline::{self, BuildOutcome};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Flags for the build command.
#[derive(clap::Args, Clone, Default)]
struct BuildArgs {
    /// Skip the freshness check and rebuild unconditionally
    #[arg(long)]
    force: bool,

    /// Treat missing papers, missing images and duplicate ids as errors
    #[arg(long)]
    strict: bool,
}

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "sitedata")]
#[command(about = "Aggregates site content into a manifest and a public asset tree")]
#[command(long_about = "\
Aggregates site content into a manifest and a public asset tree

Section folders under content/sections/ become manifest sections, ordered by
folder name. Each folder's meta.json declares the section and its pieces;
referenced images and papers are copied into public/content/.

Content structure:

  content/
  ├── site.json                    # Global descriptor, passed through as-is
  └── sections/
      ├── 01-fractals/             # Section \"fractals\"
      │   ├── meta.json            # Title, subtitle, description, paper, pieces
      │   ├── mandelbrot.png       # Copied byte-for-byte
      │   └── fractals.pdf         # Optional paper
      ├── 02-topology/
      │   ├── meta.json
      │   └── klein-bottle.svg     # Minified on publish
      └── drafts/                  # No meta.json: skipped with a warning

Output:

  src/generated/site-data.json     # { site, sections }
  public/content/<folder>/<file>   # Published assets

Builds are skipped when no input changed since the last build.

Run 'sitedata gen-config' to generate a documented sitedata.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Project root; content, manifest and public paths resolve against it
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Config file [default: <root>/sitedata.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show debug detail (every copy, freshness decisions)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only show errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Build the manifest and publish assets (default)
    Build(BuildArgs),
    /// Validate content without writing anything
    Check,
    /// Print a stock sitedata.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let command = cli.command.unwrap_or(Command::Build(BuildArgs::default()));

    match command {
        Command::Build(args) => {
            let mut build_config = load_build_config(&cli.root, cli.config.as_deref())?;
            build_config.strict |= args.strict;
            debug!("Resolved config: {build_config:?}");

            match pipeline::build(&build_config, args.force)? {
                BuildOutcome::Skipped { manifest_path } => {
                    output::print_skipped_output(&manifest_path, &cli.root);
                }
                BuildOutcome::Built(report) => {
                    output::print_build_output(&report, &cli.root);
                }
            }
        }
        Command::Check => {
            let build_config = load_build_config(&cli.root, cli.config.as_deref())?;
            let report = pipeline::check(&build_config)?;
            output::print_check_output(&report);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load `sitedata.toml` (or the explicit `--config` file) and resolve it
/// against the project root.
///
/// A missing default config file means stock defaults; a missing explicit
/// one is an error.
fn load_build_config(root: &Path, explicit: Option<&Path>) -> Result<BuildConfig, ConfigError> {
    let config_path = match explicit {
        Some(path) if !path.exists() => {
            return Err(ConfigError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("config file not found: {}", path.display()),
            )));
        }
        Some(path) => path.to_path_buf(),
        None => root.join(config::CONFIG_FILENAME),
    };
    let site_config = config::load_config(&config_path)?;
    Ok(BuildConfig::resolve(root, &site_config))
}

/// Diagnostics go to stderr: warnings by default, `-v` for debug, `-q` for
/// errors only. `RUST_LOG` overrides both flags.
fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sitedata={level}")));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_ansi(std::io::stderr().is_terminal())
                .with_writer(std::io::stderr),
        )
        .init();
}

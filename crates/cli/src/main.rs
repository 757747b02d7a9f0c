use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use xdeps_lib::config::DEFAULT_CONFIG_FILE;

mod cmd;
mod output;

use output::OutputFormat;

/// xdeps - cross-build third-party static libraries
#[derive(Parser)]
#[command(name = "xdeps")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Path to the configuration file
  #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
  config: PathBuf,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Fetch, patch and build projects in manifest order
  Build {
    /// Projects to build (default: all)
    projects: Vec<String>,
  },

  /// Show every project and whether it is already installed
  List {
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Remove extracted sources and build trees
  Clean {
    /// Projects to clean (default: all)
    projects: Vec<String>,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Build { projects } => cmd::cmd_build(&cli.config, &projects),
    Commands::List { output } => cmd::cmd_list(&cli.config, output),
    Commands::Clean { projects } => cmd::cmd_clean(&cli.config, &projects),
  }
}

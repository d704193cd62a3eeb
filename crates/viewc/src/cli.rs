//! Command-line argument parsing.

use clap::Parser;
use std::path::PathBuf;

/// Render and check view templates
#[derive(Parser, Debug, Clone)]
#[command(name = "viewc")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Templates to render; every non-component template under the
    /// template roots when none are given
    pub templates: Vec<PathBuf>,

    /// Workspace directory
    #[arg(short, long)]
    pub workspace: Option<PathBuf>,

    /// Path to viewc.json
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// JSON file whose top-level object is bound into every template
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Write rendered templates here instead of stdout
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Only compile and validate templates and components
    #[arg(long)]
    pub check: bool,

    /// Additional component directories
    #[arg(long = "components")]
    pub component_dirs: Vec<PathBuf>,

    /// Additional template root directories
    #[arg(long = "root")]
    pub template_roots: Vec<PathBuf>,

    /// Ignore patterns (glob)
    #[arg(long)]
    pub ignore: Vec<String>,

    /// Re-run when templates change
    #[arg(long)]
    pub watch: bool,

    /// Output format
    #[arg(long, default_value = "human")]
    pub output: OutputFormat,

    /// Show timing information
    #[arg(long)]
    pub timings: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Preserve watch output (don't clear screen)
    #[arg(long)]
    pub preserve_watch_output: bool,
}

/// Output format for rendered templates and failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// One JSON object per line
    Json,
}

impl Args {
    /// Default tracing filter for the verbosity requested.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "viewc=debug,view_renderer=debug,view_parser=debug"
        } else {
            "warn"
        }
    }
}

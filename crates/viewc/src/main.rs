//! viewc - render and check directive-based view templates.

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod cli;
mod config;
mod discovery;
mod orchestrator;
mod output;

use cli::Args;
use orchestrator::Orchestrator;

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    match run(args) {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("{:?}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let workspace = match args.workspace.clone() {
        Some(workspace) => workspace,
        None => std::env::current_dir().into_diagnostic()?,
    };

    let watch = args.watch;
    let mut orchestrator = Orchestrator::new(workspace, args)?;

    if watch {
        orchestrator.run_watch_mode()?;
        Ok(ExitCode::SUCCESS)
    } else {
        let result = orchestrator.run_once()?;

        if result.error_count > 0 {
            Ok(ExitCode::from(1))
        } else {
            Ok(ExitCode::SUCCESS)
        }
    }
}

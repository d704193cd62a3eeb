//! Orchestrator for rendering and checking templates.

use crate::cli::Args;
use crate::config::{self, Config};
use crate::discovery::{discover_components, discover_templates, is_view_file};
use crate::output::OutputFormatter;
use camino::{Utf8Path, Utf8PathBuf};
use miette::{IntoDiagnostic, Result, WrapErr};
use rayon::prelude::*;
use source_map::{LineCol, LineIndex};
use std::path::PathBuf;
use std::time::Instant;
use view_expr::Bindings;
use view_renderer::{FileSystemLoader, SharedBindings, TemplateSource, ViewEngine, ViewError};

/// Result of a run.
#[derive(Debug, Default)]
pub struct RunResult {
    /// Number of templates processed.
    pub file_count: usize,
    /// Number of failures.
    pub error_count: usize,
    /// Time taken.
    pub duration_ms: u64,
}

/// A template or component that failed.
#[derive(Debug)]
pub struct Failure {
    pub file: Utf8PathBuf,
    /// Where in `file` the error points, when it does.
    pub location: Option<LineCol>,
    pub error: ViewError,
}

/// What happened to one template.
enum Outcome {
    Rendered(String),
    Checked,
    Failed(Failure),
}

/// Orchestrator for running viewc.
pub struct Orchestrator {
    config: Config,
    args: Args,
    formatter: OutputFormatter,
    engine: ViewEngine,
}

impl Orchestrator {
    /// Create a new orchestrator.
    pub fn new(workspace: PathBuf, args: Args) -> Result<Self> {
        let config = Config::load(&workspace, &args)?;
        let formatter = OutputFormatter::new(args.output);
        let engine = build_engine(&config)?;

        Ok(Self {
            config,
            args,
            formatter,
            engine,
        })
    }

    /// Render or check every requested template once.
    pub fn run_once(&self) -> Result<RunResult> {
        let start = Instant::now();

        let bindings = match &self.args.data {
            Some(path) => config::load_data(path)?,
            None => Bindings::new(),
        };

        let templates = self.templates()?;
        tracing::debug!(count = templates.len(), "processing templates");

        let outcomes: Vec<(Utf8PathBuf, Outcome)> = templates
            .into_par_iter()
            .map(|file| {
                let outcome = self.process(&file, &bindings);
                (file, outcome)
            })
            .collect();

        let mut failures = Vec::new();
        if self.args.check {
            failures.extend(self.check_components());
        }

        let file_count = outcomes.len();
        for (file, outcome) in outcomes {
            match outcome {
                Outcome::Rendered(html) => self.emit(&file, &html)?,
                Outcome::Checked => {}
                Outcome::Failed(failure) => failures.push(failure),
            }
        }

        for failure in &failures {
            self.formatter.print_failure(failure);
        }

        let result = RunResult {
            file_count,
            error_count: failures.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        };

        if self.args.timings {
            eprintln!("\nTiming: {}ms", result.duration_ms);
        }
        if self.args.check || result.error_count > 0 || self.args.out_dir.is_some() {
            self.formatter.print_summary(&result);
        }

        Ok(result)
    }

    /// Run in watch mode.
    pub fn run_watch_mode(&mut self) -> Result<()> {
        use notify::{Config as NotifyConfig, RecommendedWatcher, RecursiveMode, Watcher};
        use std::sync::mpsc::channel;
        use std::time::Duration;

        eprintln!("Starting watch mode...\n");

        if let Err(err) = self.run_once() {
            eprintln!("{:?}", err);
        }

        let (tx, rx) = channel();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                if let Ok(event) = res {
                    let _ = tx.send(event);
                }
            },
            NotifyConfig::default().with_poll_interval(Duration::from_millis(500)),
        )
        .into_diagnostic()?;

        watcher
            .watch(self.config.workspace.as_std_path(), RecursiveMode::Recursive)
            .into_diagnostic()?;

        loop {
            match rx.recv_timeout(Duration::from_millis(100)) {
                Ok(event) => {
                    if !event.paths.iter().any(|path| self.is_relevant(path)) {
                        continue;
                    }

                    if !self.args.preserve_watch_output {
                        print!("\x1B[2J\x1B[1;1H");
                    }
                    eprintln!("File change detected. Rerunning...\n");

                    // Components may have been added, removed or edited.
                    match build_engine(&self.config) {
                        Ok(engine) => self.engine = engine,
                        Err(err) => {
                            eprintln!("{:?}", err);
                            continue;
                        }
                    }
                    if let Err(err) = self.run_once() {
                        eprintln!("{:?}", err);
                    }
                }
                Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
                Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }

        Ok(())
    }

    fn is_relevant(&self, path: &std::path::Path) -> bool {
        let Ok(path) = Utf8PathBuf::from_path_buf(path.to_path_buf()) else {
            return false;
        };
        if let Some(out_dir) = &self.args.out_dir {
            if path.as_std_path().starts_with(out_dir) {
                return false;
            }
        }
        if self.config.is_ignored(&path) {
            return false;
        }
        is_view_file(&path)
            || self.args.data.as_deref() == Some(path.as_std_path())
            || self.config.config_path.as_ref() == Some(&path)
    }

    /// Templates named on the command line, or every page template found.
    fn templates(&self) -> Result<Vec<Utf8PathBuf>> {
        if self.args.templates.is_empty() {
            return Ok(discover_templates(&self.config));
        }
        self.args
            .templates
            .iter()
            .map(|path| {
                Utf8PathBuf::from_path_buf(path.clone())
                    .map_err(|path| miette::miette!("Path is not valid UTF-8: {}", path.display()))
            })
            .collect()
    }

    fn process(&self, file: &Utf8Path, bindings: &Bindings) -> Outcome {
        let source = TemplateSource::path(file);

        // Compile first so compile errors can be located in this file.
        if let Err(error) = self.engine.compile(&source) {
            let location = error.span().and_then(|span| {
                let markup = self.engine.load_markup(&source).ok()?;
                Some(LineIndex::new(&markup).locate(span))
            });
            return Outcome::Failed(Failure {
                file: file.to_path_buf(),
                location,
                error,
            });
        }

        if self.args.check {
            return Outcome::Checked;
        }

        match self.engine.render(source, bindings.clone()) {
            Ok(html) => Outcome::Rendered(html),
            Err(error) => Outcome::Failed(Failure {
                file: file.to_path_buf(),
                location: None,
                error,
            }),
        }
    }

    fn check_components(&self) -> Vec<Failure> {
        self.engine
            .check_components()
            .into_iter()
            .map(|(name, error)| {
                let file = self
                    .engine
                    .registry()
                    .get(&name)
                    .and_then(|definition| definition.origin_file.clone())
                    .unwrap_or_else(|| Utf8PathBuf::from(format!("<{}>", name)));
                let location = error.span().and_then(|span| {
                    let markup = std::fs::read_to_string(&file).ok()?;
                    Some(LineIndex::new(&markup).locate(span))
                });
                Failure {
                    file,
                    location,
                    error,
                }
            })
            .collect()
    }

    fn emit(&self, file: &Utf8Path, html: &str) -> Result<()> {
        let Some(out_dir) = &self.args.out_dir else {
            self.formatter.print_rendered(file, html);
            return Ok(());
        };

        let out = out_dir.join(output_name(file, &self.config.template_roots));
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&out, html)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to write {}", out.display()))?;

        let out = Utf8PathBuf::from_path_buf(out).unwrap_or_else(|out| out.to_string_lossy().into_owned().into());
        self.formatter.print_written(file, &out);
        Ok(())
    }
}

/// Build an engine with every discovered component registered.
fn build_engine(config: &Config) -> Result<ViewEngine> {
    let mut engine = ViewEngine::new()
        .with_loader(FileSystemLoader::new(config.template_roots.clone()))
        .with_options(config.engine_options.clone());
    engine.add_processor(SharedBindings::new(config.globals.clone()));

    for component in discover_components(config) {
        engine
            .register_component(
                &component.name,
                TemplateSource::path(component.path.clone()),
                Some(component.path),
                component.is_vendor,
            )
            .into_diagnostic()?;
    }

    tracing::debug!(?engine, "view engine ready");
    Ok(engine)
}

/// Output path of a template, relative to the output directory:
/// `<root>/blog/post.view.html` becomes `blog/post.html`.
fn output_name(file: &Utf8Path, roots: &[Utf8PathBuf]) -> Utf8PathBuf {
    let relative = roots
        .iter()
        .find_map(|root| file.strip_prefix(root).ok())
        .unwrap_or(file);
    let relative = if relative.is_absolute() {
        Utf8Path::new(relative.file_name().unwrap_or("index.view.html"))
    } else {
        relative
    };

    let name = relative.file_name().unwrap_or_default();
    let stem = name
        .strip_suffix(".view.html")
        .or_else(|| name.strip_suffix(".html"))
        .unwrap_or(name);
    relative.with_file_name(format!("{}.html", stem))
}

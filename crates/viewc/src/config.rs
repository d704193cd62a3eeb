//! Configuration loading and management.

use crate::cli::Args;
use camino::{Utf8Path, Utf8PathBuf};
use globset::{Glob, GlobSet, GlobSetBuilder};
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use view_expr::{Bindings, Value};
use view_renderer::EngineOptions;

/// Name of the configuration file.
pub const CONFIG_FILE: &str = "viewc.json";

/// Contents of `viewc.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewConfig {
    /// Directories searched for `x-*.view.html` components.
    #[serde(default)]
    pub component_dirs: Vec<PathBuf>,
    /// Directories templates are resolved against.
    #[serde(default)]
    pub template_roots: Vec<PathBuf>,
    /// Ignore patterns.
    #[serde(default)]
    pub ignore: Vec<String>,
    /// Bindings available in every template.
    #[serde(default)]
    pub globals: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub component_prefix: Option<String>,
    #[serde(default)]
    pub max_component_depth: Option<usize>,
}

impl ViewConfig {
    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to parse {}", path.display()))
    }

    /// Find viewc.json in a directory or its parents.
    pub fn find(dir: &Path) -> Option<PathBuf> {
        let mut current = dir;
        loop {
            let candidate = current.join(CONFIG_FILE);
            if candidate.is_file() {
                return Some(candidate);
            }
            current = current.parent()?;
        }
    }
}

/// Resolved configuration for a run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Workspace root directory.
    pub workspace: Utf8PathBuf,
    /// The configuration file in use, if any.
    pub config_path: Option<Utf8PathBuf>,
    pub component_dirs: Vec<Utf8PathBuf>,
    pub template_roots: Vec<Utf8PathBuf>,
    /// Compiled ignore patterns.
    pub ignore: GlobSet,
    /// Bindings available in every template.
    pub globals: Bindings,
    pub engine_options: EngineOptions,
}

impl Config {
    /// Load configuration from CLI arguments and workspace.
    pub fn load(workspace: &Path, args: &Args) -> Result<Self> {
        let workspace = utf8(workspace.to_path_buf())?;

        let config_path = match &args.config {
            Some(path) => Some(utf8(path.clone())?),
            None => ViewConfig::find(workspace.as_std_path()).map(utf8).transpose()?,
        };
        let file = match &config_path {
            Some(path) => ViewConfig::load(path.as_std_path())?,
            None => ViewConfig::default(),
        };

        // Paths in the config file are relative to the file.
        let base = config_path
            .as_deref()
            .and_then(Utf8Path::parent)
            .unwrap_or(workspace.as_path())
            .to_path_buf();

        let mut component_dirs = resolve_all(&base, file.component_dirs)?;
        component_dirs.extend(resolve_all(&workspace, args.component_dirs.clone())?);
        if component_dirs.is_empty() {
            component_dirs.push(workspace.clone());
        }

        let mut template_roots = resolve_all(&base, file.template_roots)?;
        template_roots.extend(resolve_all(&workspace, args.template_roots.clone())?);
        if template_roots.is_empty() {
            template_roots.push(workspace.clone());
        }

        let mut patterns = vec!["**/node_modules/**".to_string(), "**/.git/**".to_string()];
        patterns.extend(file.ignore);
        patterns.extend(args.ignore.iter().cloned());
        let ignore = build_globset(&patterns)?;

        let globals = bindings_from_json(serde_json::Value::Object(file.globals))?;

        let defaults = EngineOptions::default();
        let engine_options = EngineOptions {
            max_component_depth: file.max_component_depth.unwrap_or(defaults.max_component_depth),
            max_depth: defaults.max_depth,
            component_prefix: file
                .component_prefix
                .map(Into::into)
                .unwrap_or(defaults.component_prefix),
            cache: true,
        };

        Ok(Self {
            workspace,
            config_path,
            component_dirs,
            template_roots,
            ignore,
            globals,
            engine_options,
        })
    }

    /// Check if a path matches an ignore pattern.
    pub fn is_ignored(&self, path: &Utf8Path) -> bool {
        self.ignore.is_match(path.as_std_path())
    }
}

/// Turn a JSON object into template bindings.
pub fn bindings_from_json(value: serde_json::Value) -> Result<Bindings> {
    match Value::from(value) {
        Value::Map(map) => Ok(map.into_iter().map(|(name, value)| (name.into(), value)).collect()),
        other => Err(miette::miette!(
            "Template data must be a JSON object, found {}",
            other.type_name()
        )),
    }
}

/// Load template data from a JSON file.
pub fn load_data(path: &Path) -> Result<Bindings> {
    let content = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to parse {}", path.display()))?;
    bindings_from_json(value).wrap_err_with(|| format!("Invalid data in {}", path.display()))
}

fn utf8(path: PathBuf) -> Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path)
        .map_err(|path| miette::miette!("Path is not valid UTF-8: {}", path.display()))
}

fn resolve_all(base: &Utf8Path, paths: Vec<PathBuf>) -> Result<Vec<Utf8PathBuf>> {
    paths
        .into_iter()
        .map(|path| utf8(path).map(|path| base.join(path)))
        .collect()
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .into_diagnostic()
            .wrap_err_with(|| format!("Invalid ignore pattern `{}`", pattern))?;
        builder.add(glob);
    }
    builder.build().into_diagnostic()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    fn args(extra: &[&str]) -> Args {
        Args::parse_from(std::iter::once("viewc").chain(extra.iter().copied()))
    }

    #[test]
    fn test_find_config_in_parent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("site/pages");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{}").unwrap();

        assert_eq!(ViewConfig::find(&nested), Some(dir.path().join(CONFIG_FILE)));
    }

    #[test]
    fn test_load_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{
                "componentDirs": ["components"],
                "templateRoots": ["views"],
                "ignore": ["**/drafts/**"],
                "globals": {"site": "Docs"},
                "maxComponentDepth": 16
            }"#,
        )
        .unwrap();

        let config = Config::load(dir.path(), &args(&["--components", "extra"])).unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();

        assert_eq!(config.component_dirs, vec![root.join("components"), root.join("extra")]);
        assert_eq!(config.template_roots, vec![root.join("views")]);
        assert_eq!(config.globals["site"], Value::from("Docs"));
        assert_eq!(config.engine_options.max_component_depth, 16);
        assert_eq!(config.engine_options.component_prefix, "x-");
        assert!(config.is_ignored(&root.join("views/drafts/a.view.html")));
        assert!(config.is_ignored(&root.join("node_modules/pkg/x-a.view.html")));
        assert!(!config.is_ignored(&root.join("views/a.view.html")));
    }

    #[test]
    fn test_defaults_without_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path(), &args(&[])).unwrap();
        assert_eq!(config.component_dirs, vec![config.workspace.clone()]);
        assert_eq!(config.template_roots, vec![config.workspace.clone()]);
        assert!(config.globals.is_empty());
    }

    #[test]
    fn test_data_must_be_an_object() {
        assert!(bindings_from_json(serde_json::json!([1, 2])).is_err());
        let bindings = bindings_from_json(serde_json::json!({"a": 1})).unwrap();
        assert_eq!(bindings["a"], Value::Int(1));
    }
}

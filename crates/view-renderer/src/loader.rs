//! Template loaders.

use crate::error::{ViewError, ViewResult};
use camino::{Utf8Path, Utf8PathBuf};
use rustc_hash::FxHashMap;

/// File extension of view templates.
pub const VIEW_EXTENSION: &str = "view.html";

/// A template read by a loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedTemplate {
    /// The path the template was found at.
    pub path: Utf8PathBuf,
    /// The template markup.
    pub source: String,
}

/// Resolves template paths to markup.
pub trait TemplateLoader: Send + Sync {
    /// Load the template at `path`, failing with
    /// [`ViewError::TemplateNotFound`] if it does not exist.
    fn load(&self, path: &Utf8Path) -> ViewResult<LoadedTemplate>;
}

/// Loads templates from disk.
///
/// Absolute paths are read as-is. Relative paths are tried against each root
/// in order; a path without an extension also matches `<path>.view.html`.
#[derive(Debug, Clone, Default)]
pub struct FileSystemLoader {
    roots: Vec<Utf8PathBuf>,
}

impl FileSystemLoader {
    /// Create a loader over the given root directories.
    pub fn new(roots: impl IntoIterator<Item = impl Into<Utf8PathBuf>>) -> Self {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    /// Add a root directory, searched after the existing ones.
    pub fn with_root(mut self, root: impl Into<Utf8PathBuf>) -> Self {
        self.roots.push(root.into());
        self
    }

    pub fn roots(&self) -> &[Utf8PathBuf] {
        &self.roots
    }

    fn candidates(&self, path: &Utf8Path) -> Vec<Utf8PathBuf> {
        let bases: Vec<Utf8PathBuf> = if path.is_absolute() || self.roots.is_empty() {
            vec![path.to_path_buf()]
        } else {
            self.roots.iter().map(|root| root.join(path)).collect()
        };

        let mut candidates = Vec::with_capacity(bases.len() * 2);
        for base in bases {
            if base.extension().is_none() {
                candidates.push(Utf8PathBuf::from(format!("{}.{}", base, VIEW_EXTENSION)));
            }
            candidates.push(base);
        }
        candidates
    }
}

impl TemplateLoader for FileSystemLoader {
    fn load(&self, path: &Utf8Path) -> ViewResult<LoadedTemplate> {
        for candidate in self.candidates(path) {
            if !candidate.is_file() {
                continue;
            }
            let source = std::fs::read_to_string(&candidate).map_err(|source| ViewError::Io {
                path: candidate.clone(),
                source,
            })?;
            tracing::debug!(path = %candidate, "loaded template");
            return Ok(LoadedTemplate {
                path: candidate,
                source,
            });
        }

        Err(ViewError::TemplateNotFound {
            path: path.to_path_buf(),
        })
    }
}

/// Serves templates from memory, keyed by exact path.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    templates: FxHashMap<Utf8PathBuf, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template.
    pub fn insert(&mut self, path: impl Into<Utf8PathBuf>, source: impl Into<String>) {
        self.templates.insert(path.into(), source.into());
    }

    /// Add a template, builder style.
    pub fn with_template(mut self, path: impl Into<Utf8PathBuf>, source: impl Into<String>) -> Self {
        self.insert(path, source);
        self
    }
}

impl TemplateLoader for MemoryLoader {
    fn load(&self, path: &Utf8Path) -> ViewResult<LoadedTemplate> {
        self.templates
            .get(path)
            .map(|source| LoadedTemplate {
                path: path.to_path_buf(),
                source: source.clone(),
            })
            .ok_or_else(|| ViewError::TemplateNotFound {
                path: path.to_path_buf(),
            })
    }
}

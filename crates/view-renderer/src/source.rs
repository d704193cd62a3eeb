//! Template sources.

use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;

/// Where a template's markup comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TemplateSource {
    /// Markup given directly.
    Inline(String),
    /// A path resolved through the engine's loader.
    Path(Utf8PathBuf),
}

impl TemplateSource {
    pub fn inline(markup: impl Into<String>) -> Self {
        Self::Inline(markup.into())
    }

    pub fn path(path: impl Into<Utf8PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// The path, for path-based sources.
    pub fn as_path(&self) -> Option<&Utf8Path> {
        match self {
            Self::Path(path) => Some(path),
            Self::Inline(_) => None,
        }
    }
}

impl fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline(_) => f.write_str("<inline>"),
            Self::Path(path) => write!(f, "{}", path),
        }
    }
}

impl From<&str> for TemplateSource {
    fn from(markup: &str) -> Self {
        Self::Inline(markup.to_string())
    }
}

impl From<Utf8PathBuf> for TemplateSource {
    fn from(path: Utf8PathBuf) -> Self {
        Self::Path(path)
    }
}

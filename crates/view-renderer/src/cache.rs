//! Compiled template cache.

use crate::error::ViewResult;
use camino::Utf8PathBuf;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use std::sync::{Arc, PoisonError, RwLock};
use view_parser::Template;

/// Identity of a compiled template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// A template loaded by path, keyed by the path as requested.
    Path(Utf8PathBuf),
    /// Inline markup, keyed by the markup itself.
    Inline(String),
    /// A registered component, keyed by tag name.
    Component(SmolStr),
}

/// Compiled templates, shared read-only between renders.
///
/// Owned by the embedding application and handed to the engine, so several
/// engines (or threads) can share one store.
#[derive(Debug, Default)]
pub struct ViewCache {
    entries: RwLock<FxHashMap<CacheKey, Arc<Template>>>,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a compiled template.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<Template>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Store a compiled template.
    pub fn insert(&self, key: CacheKey, template: Arc<Template>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, template);
    }

    /// Return the cached template for `key`, compiling and storing it on a miss.
    ///
    /// Failed compilations are not cached.
    pub fn get_or_compile<F>(&self, key: CacheKey, compile: F) -> ViewResult<Arc<Template>>
    where
        F: FnOnce() -> ViewResult<Template>,
    {
        if let Some(template) = self.get(&key) {
            tracing::debug!(?key, "view cache hit");
            return Ok(template);
        }

        tracing::debug!(?key, "view cache miss");
        let template = Arc::new(compile()?);
        self.insert(key, Arc::clone(&template));
        Ok(template)
    }

    /// Drop one entry.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

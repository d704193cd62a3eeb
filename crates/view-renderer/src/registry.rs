//! Component registry.

use crate::error::{ViewError, ViewResult};
use crate::source::TemplateSource;
use camino::Utf8PathBuf;
use indexmap::IndexMap;
use smol_str::SmolStr;

/// A registered component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDefinition {
    /// Tag name, including the component prefix (`x-card`).
    pub name: SmolStr,
    /// The component's template.
    pub source: TemplateSource,
    /// File the component was discovered in, if any.
    pub origin_file: Option<Utf8PathBuf>,
    /// Whether the component ships with a third-party package.
    pub is_vendor: bool,
}

impl ComponentDefinition {
    fn origin(&self) -> String {
        match &self.origin_file {
            Some(path) => path.to_string(),
            None => "<inline>".to_string(),
        }
    }
}

/// What a registration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// A new name.
    Added,
    /// Replaced an existing definition.
    Replaced,
    /// A vendor component lost to an existing application component.
    Ignored,
}

/// Components by tag name.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    components: IndexMap<SmolStr, ComponentDefinition>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component.
    ///
    /// Application components override vendor components of the same name in
    /// either registration order; a later vendor component replaces an
    /// earlier vendor one. Two application components with one name fail
    /// with [`ViewError::DuplicateComponent`].
    pub fn register(&mut self, definition: ComponentDefinition) -> ViewResult<Registration> {
        let Some(existing) = self.components.get(&definition.name) else {
            tracing::debug!(name = %definition.name, vendor = definition.is_vendor, "registered view component");
            self.components.insert(definition.name.clone(), definition);
            return Ok(Registration::Added);
        };

        match (existing.is_vendor, definition.is_vendor) {
            (false, true) => {
                tracing::debug!(name = %definition.name, "vendor view component shadowed by application component");
                Ok(Registration::Ignored)
            }
            (false, false) => Err(ViewError::DuplicateComponent {
                name: definition.name.clone(),
                first: existing.origin(),
                second: definition.origin(),
            }),
            (true, _) => {
                tracing::debug!(name = %definition.name, "replaced view component");
                self.components.insert(definition.name.clone(), definition);
                Ok(Registration::Replaced)
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&ComponentDefinition> {
        self.components.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &SmolStr> {
        self.components.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentDefinition> {
        self.components.values()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

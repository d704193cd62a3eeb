//! The view engine: compile, cache and render templates.

use crate::cache::{CacheKey, ViewCache};
use crate::error::{ViewError, ViewResult};
use crate::loader::{FileSystemLoader, TemplateLoader};
use crate::processor::ViewProcessor;
use crate::registry::{ComponentDefinition, ComponentRegistry, Registration};
use crate::renderer::Renderer;
use crate::source::TemplateSource;
use camino::Utf8PathBuf;
use smol_str::SmolStr;
use std::fmt;
use std::sync::Arc;
use view_expr::{Bindings, Evaluator, ExpressionEvaluator, Scope};
use view_parser::{ParseOptions, Template, DEFAULT_MAX_DEPTH};

/// Engine options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// How deeply components may nest before rendering fails.
    pub max_component_depth: usize,
    /// How deeply elements may nest, within one template when parsing and
    /// across expanded components when rendering.
    pub max_depth: usize,
    /// Tag prefix marking component references.
    pub component_prefix: SmolStr,
    /// Keep compiled templates in the cache.
    pub cache: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_component_depth: 64,
            max_depth: DEFAULT_MAX_DEPTH,
            component_prefix: SmolStr::new_static("x-"),
            cache: true,
        }
    }
}

/// Compiles and renders view templates.
///
/// Components must be registered before rendering starts; the engine is
/// read-only while rendering and can be shared between threads.
pub struct ViewEngine {
    registry: ComponentRegistry,
    loader: Box<dyn TemplateLoader>,
    evaluator: Arc<dyn Evaluator>,
    cache: Arc<ViewCache>,
    processors: Vec<Box<dyn ViewProcessor>>,
    options: EngineOptions,
    parse_options: ParseOptions,
}

impl Default for ViewEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewEngine {
    /// An engine that loads templates relative to the working directory.
    pub fn new() -> Self {
        Self {
            registry: ComponentRegistry::new(),
            loader: Box::new(FileSystemLoader::default()),
            evaluator: Arc::new(ExpressionEvaluator::new()),
            cache: Arc::new(ViewCache::new()),
            processors: Vec::new(),
            options: EngineOptions::default(),
            parse_options: ParseOptions::default(),
        }
    }

    pub fn with_loader(mut self, loader: impl TemplateLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Use an application-owned cache.
    pub fn with_cache(mut self, cache: Arc<ViewCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Start from an already populated registry.
    pub fn with_registry(mut self, registry: ComponentRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.parse_options = ParseOptions {
            component_prefix: options.component_prefix.clone(),
            max_depth: options.max_depth,
        };
        self.options = options;
        self
    }

    /// Add a processor, run before every top-level render in the order added.
    pub fn add_processor(&mut self, processor: impl ViewProcessor + 'static) {
        self.processors.push(Box::new(processor));
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn evaluator(&self) -> &dyn Evaluator {
        self.evaluator.as_ref()
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &Arc<ViewCache> {
        &self.cache
    }

    /// Register a component under `name`, adding the component prefix when
    /// the name lacks it.
    pub fn register_component(
        &mut self,
        name: &str,
        source: impl Into<TemplateSource>,
        origin_file: Option<Utf8PathBuf>,
        is_vendor: bool,
    ) -> ViewResult<Registration> {
        let prefix = &self.options.component_prefix;
        let name = if name.starts_with(prefix.as_str()) {
            SmolStr::from(name)
        } else {
            SmolStr::from(format!("{}{}", prefix, name))
        };

        let registration = self.registry.register(ComponentDefinition {
            name: name.clone(),
            source: source.into(),
            origin_file,
            is_vendor,
        })?;
        if registration != Registration::Ignored {
            self.cache.invalidate(&CacheKey::Component(name));
        }
        Ok(registration)
    }

    /// Compile a template, or fetch it from the cache.
    pub fn compile(&self, source: &TemplateSource) -> ViewResult<Arc<Template>> {
        let key = match source {
            TemplateSource::Inline(markup) => CacheKey::Inline(markup.clone()),
            TemplateSource::Path(path) => CacheKey::Path(path.clone()),
        };
        self.compile_keyed(key, source)
    }

    /// The compiled template of a registered component.
    pub fn component_template(&self, name: &str) -> ViewResult<Arc<Template>> {
        let definition = self
            .registry
            .get(name)
            .ok_or_else(|| ViewError::ComponentNotFound { name: name.into() })?;
        self.compile_keyed(CacheKey::Component(definition.name.clone()), &definition.source)
    }

    /// Compile every registered component, collecting the failures.
    pub fn check_components(&self) -> Vec<(SmolStr, ViewError)> {
        self.registry
            .names()
            .filter_map(|name| {
                self.component_template(name)
                    .err()
                    .map(|err| (name.clone(), err))
            })
            .collect()
    }

    /// Render a template with the given bindings.
    pub fn render(&self, source: impl Into<TemplateSource>, bindings: Bindings) -> ViewResult<String> {
        let source = source.into();
        let _span = tracing::debug_span!("render", view = %source).entered();

        let template = self.compile(&source)?;

        let mut bindings = bindings;
        for processor in &self.processors {
            processor.process(&source, &mut bindings);
        }

        let scope = Scope::root(bindings);
        Renderer::new(self).render(&template, &scope)
    }

    /// The markup behind a source.
    pub fn load_markup(&self, source: &TemplateSource) -> ViewResult<String> {
        match source {
            TemplateSource::Inline(markup) => Ok(markup.clone()),
            TemplateSource::Path(path) => Ok(self.loader.load(path)?.source),
        }
    }

    fn compile_keyed(&self, key: CacheKey, source: &TemplateSource) -> ViewResult<Arc<Template>> {
        let compile = || -> ViewResult<Template> {
            let markup = self.load_markup(source)?;
            Ok(view_parser::compile_with(&markup, &self.parse_options)?)
        };

        if self.options.cache {
            self.cache.get_or_compile(key, compile)
        } else {
            compile().map(Arc::new)
        }
    }
}

impl fmt::Debug for ViewEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewEngine")
            .field("components", &self.registry.len())
            .field("processors", &self.processors.len())
            .field("cached", &self.cache.len())
            .field("options", &self.options)
            .finish()
    }
}

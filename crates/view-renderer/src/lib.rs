//! Rendering for directive-based view templates.
//!
//! [`ViewEngine`] is the entry point: it resolves a [`TemplateSource`],
//! compiles it through `view-parser` (caching the immutable result), and
//! renders it against a fresh [`Scope`](view_expr::Scope) built from the
//! caller's bindings. Components registered on the engine are expanded in
//! place of their tags, with their slots filled from the caller.
//!
//! ```
//! use view_expr::{Bindings, Value};
//! use view_renderer::ViewEngine;
//!
//! let mut engine = ViewEngine::new();
//! engine
//!     .register_component("x-greeting", "<p>Hello, <x-slot /></p>", None, false)
//!     .unwrap();
//!
//! let bindings = Bindings::from_iter([("name".into(), Value::from("<Ada>"))]);
//! let html = engine.render("<x-greeting>{{ $name }}</x-greeting>", bindings).unwrap();
//! assert_eq!(html, "<p>Hello, &lt;Ada&gt;</p>");
//! ```

pub mod cache;
pub mod component;
pub mod directives;
pub mod engine;
pub mod error;
pub mod html;
pub mod loader;
pub mod processor;
pub mod registry;
mod renderer;
pub mod source;

pub use cache::{CacheKey, ViewCache};
pub use engine::{EngineOptions, ViewEngine};
pub use error::{ViewError, ViewResult};
pub use loader::{FileSystemLoader, LoadedTemplate, MemoryLoader, TemplateLoader, VIEW_EXTENSION};
pub use processor::{SharedBindings, ViewProcessor};
pub use registry::{ComponentDefinition, ComponentRegistry, Registration};
pub use source::TemplateSource;

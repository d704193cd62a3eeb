//! View template parser.
//!
//! This crate turns directive-annotated HTML into an AST. Parsing recognizes
//! interpolations, template comments, elements, component references and
//! slot markers; the resolver then links `:if`/`:elseif`/`:else` chains and
//! `:foreach`/`:forelse` pairs and rejects misplaced directives. The result
//! is immutable and can be shared between any number of renders.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod resolver;

pub use ast::*;
pub use error::{CompileError, CompileErrorCode, CompileResult};
pub use parser::{parse_template, parse_template_with, ParseOptions, DEFAULT_MAX_DEPTH};
pub use resolver::resolve;

/// Parse and validate a template with the default options.
pub fn compile(source: &str) -> CompileResult<Template> {
    compile_with(source, &ParseOptions::default())
}

/// Parse and validate a template.
pub fn compile_with(source: &str, options: &ParseOptions) -> CompileResult<Template> {
    let template = parse_template_with(source, options)?;
    let template = resolve(template)?;
    tracing::debug!(
        nodes = template.children.len(),
        bytes = source.len(),
        "compiled template"
    );
    Ok(template)
}

//! Variable resolution and template rendering for ObjectVersion bodies
//!
//! An ObjectVersion body is text with `{{name}}` placeholders. Rendering takes
//! three steps:
//!
//! 1. [`resolve_variables`] layers ApplicationObject and Application overrides
//! 2. [`TemplateEngine`] substitutes placeholders (missing keys render empty)
//! 3. [`render_document`] decodes the rendered YAML into a generic document
//!
//! # Placeholder syntax
//!
//! - `{{name}}`, `{{ name }}` and `{{ .name }}` all address variable `name`
//! - `{{ my-var }}` addresses the variable named exactly `my-var`
//! - `{%` and `{#` are plain text

mod document;
mod engine;
mod error;
mod variables;

pub use document::render_document;
pub use engine::TemplateEngine;
pub use error::TemplateError;
pub use variables::{resolve_variables, Variables};

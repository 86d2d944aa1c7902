//! Rendering an ObjectVersion body into a generic document

use serde_json::Value;

use super::engine::TemplateEngine;
use super::error::TemplateError;
use super::variables::Variables;

/// Render `body` with `variables` and decode the result as YAML.
///
/// Bodies without template syntax are decoded as-is. Empty output decodes
/// to `Value::Null`.
pub fn render_document(
    engine: &TemplateEngine,
    body: &str,
    variables: &Variables,
) -> Result<Value, TemplateError> {
    let rendered = if TemplateEngine::has_template_syntax(body) {
        engine.render(body, variables)?
    } else {
        body.to_string()
    };

    if rendered.trim().is_empty() {
        return Ok(Value::Null);
    }

    Ok(serde_yaml::from_str(&rendered)?)
}

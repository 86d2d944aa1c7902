//! Template engine for ObjectVersion bodies
//!
//! Uses minijinja with `{{...}}` as the only active syntax. Block and comment
//! delimiters are moved to sequences that never occur in a manifest, so text
//! such as `${#ARGS}` or `printf {%d}` passes through untouched.
//!
//! Undefined variables render as empty text instead of failing, so one
//! missing optional variable never blocks an object.

use std::collections::BTreeMap;

use minijinja::syntax::SyntaxConfig;
use minijinja::{Environment, UndefinedBehavior, Value};

use super::error::TemplateError;
use super::variables::Variables;

/// Context key holding every variable under its exact name
///
/// Hyphenated placeholders are rewritten to a subscript on this map, since
/// minijinja would read the hyphen as subtraction.
const EXACT_LOOKUP: &str = "__braid_vars";

/// Template engine for `{{name}}` placeholder substitution
///
/// Supports:
/// - `{{name}}`, `{{ name }}` and `{{ .name }}` placeholders
/// - Hyphenated names (`{{ my-var }}`), matched exactly
/// - Chainable undefined handling (missing keys render empty)
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine {
    /// Create a new template engine
    ///
    /// # Panics
    ///
    /// Panics if minijinja rejects the syntax configuration. The delimiters
    /// are hardcoded, so this indicates a minijinja API change.
    pub fn new() -> Self {
        let syntax = SyntaxConfig::builder()
            .variable_delimiters("{{", "}}")
            .block_delimiters("\u{0}{%", "%}\u{0}")
            .comment_delimiters("\u{0}{#", "#}\u{0}")
            .build()
            .expect("template syntax configuration is hardcoded and valid");

        let mut env = Environment::new();
        env.set_syntax(syntax);
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        Self { env }
    }

    /// Render a template body with the given variables
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::Render` if a `{{...}}` expression is invalid or
    /// a filter fails. Undefined variables are not an error.
    pub fn render(&self, template: &str, variables: &Variables) -> Result<String, TemplateError> {
        let normalized = normalize_template_identifiers(template);
        self.env
            .render_str(&normalized, build_context(variables))
            .map_err(TemplateError::from)
    }

    /// Check if a string contains a placeholder
    pub fn has_template_syntax(s: &str) -> bool {
        s.contains("{{")
    }
}

/// Every variable under its own name, plus the exact-name lookup map.
fn build_context(variables: &Variables) -> Value {
    let exact = Value::from_iter(
        variables
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string())),
    );
    let mut ctx: BTreeMap<String, Value> = variables
        .iter()
        .map(|(name, value)| (name.to_string(), Value::from(value)))
        .collect();
    ctx.insert(EXACT_LOOKUP.to_string(), exact);
    Value::from_iter(ctx)
}

/// Normalize identifiers within `{{...}}` expressions.
///
/// Converts `{{ .name }}` → `{{ name }}` so minijinja does not reject the
/// leading dot, and `{{ my-var }}` → `{{ __braid_vars["my-var"] }}` so the
/// hyphen is not read as subtraction. Quoted strings are preserved.
fn normalize_template_identifiers(template: &str) -> String {
    let mut result = String::with_capacity(template.len());
    let mut remaining = template;

    while let Some(start) = remaining.find("{{") {
        result.push_str(&remaining[..start + 2]);
        remaining = &remaining[start + 2..];

        if let Some(end) = remaining.find("}}") {
            result.push_str(&normalize_expression(&remaining[..end]));
            result.push_str("}}");
            remaining = &remaining[end + 2..];
        } else {
            // No closing braces, leave it for minijinja to report
            result.push_str(remaining);
            remaining = "";
        }
    }

    result.push_str(remaining);
    result
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Rewrite one expression, skipping quoted strings.
fn normalize_expression(expr: &str) -> String {
    let mut result = String::with_capacity(expr.len());
    let mut chars = expr.chars().peekable();

    while let Some(ch) = chars.next() {
        let prev = result.chars().last();
        match ch {
            '\'' | '"' => {
                result.push(ch);
                let mut escaped = false;
                for inner in chars.by_ref() {
                    result.push(inner);
                    if escaped {
                        escaped = false;
                    } else if inner == '\\' {
                        escaped = true;
                    } else if inner == ch {
                        break;
                    }
                }
            }
            '.' => {
                // A dot that starts an identifier is the root-context marker
                let follows_value =
                    prev.is_some_and(|c| is_ident_char(c) || c == ')' || c == ']');
                let next_is_ident = chars.peek().is_some_and(|c| is_ident_start(*c));
                if follows_value || !next_is_ident {
                    result.push('.');
                }
            }
            c if is_ident_start(c) && !prev.is_some_and(is_ident_char) => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if is_ident_char(next) {
                        word.push(next);
                        chars.next();
                    } else if next == '-' && word_continues(&chars) {
                        word.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }

                if word.contains('-') && prev != Some('.') {
                    result.push_str(&format!("{EXACT_LOOKUP}[\"{word}\"]"));
                } else {
                    result.push_str(&word);
                }
            }
            _ => result.push(ch),
        }
    }

    result
}

/// Whether the `-` at the head of `chars` joins two identifier characters.
fn word_continues(chars: &std::iter::Peekable<std::str::Chars<'_>>) -> bool {
    let mut lookahead = chars.clone();
    lookahead.next();
    lookahead.next().is_some_and(is_ident_char)
}

//! Template error types

use std::fmt;

/// Errors that can occur while turning a template body into a document
#[derive(Debug)]
pub enum TemplateError {
    /// Template rendering failed (syntax error, bad filter, ...)
    Render(minijinja::Error),
    /// Rendered text is not a valid YAML document
    Decode(serde_yaml::Error),
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Render(e) => write!(f, "template render error: {}", e),
            Self::Decode(e) => write!(f, "rendered document is not valid YAML: {}", e),
        }
    }
}

impl std::error::Error for TemplateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Render(e) => Some(e),
            Self::Decode(e) => Some(e),
        }
    }
}

impl From<minijinja::Error> for TemplateError {
    fn from(err: minijinja::Error) -> Self {
        Self::Render(err)
    }
}

impl From<serde_yaml::Error> for TemplateError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Decode(err)
    }
}

//! Error types for the braid controller
//!
//! Every variant maps onto one failure class the external scheduler acts on:
//! transient store failures, missing dependencies, per-object template
//! failures, and malformed resources.

use thiserror::Error;

use crate::template::TemplateError;

/// Main error type for braid operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// A referenced ApplicationTemplate or ObjectVersion does not exist (yet)
    #[error("{kind} {namespace}/{name} not found")]
    DependencyMissing {
        /// Kind of the missing resource
        kind: &'static str,
        /// Namespace that was searched
        namespace: String,
        /// Name that was requested
        name: String,
    },

    /// Rendering or decoding the body of one ObjectVersion failed
    #[error("template error in ObjectVersion {object}: {source}")]
    Template {
        /// Name of the ObjectVersion whose body failed
        object: String,
        /// The underlying render or decode failure
        #[source]
        source: TemplateError,
    },

    /// A resource is malformed (bad apiVersion, missing namespace or uid)
    #[error("validation error: {0}")]
    Validation(String),
}

impl Error {
    /// Create a dependency-missing error
    pub fn dependency_missing(
        kind: &'static str,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::DependencyMissing {
            kind,
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Create a template error scoped to one ObjectVersion
    pub fn template(object: impl Into<String>, source: TemplateError) -> Self {
        Self::Template {
            object: object.into(),
            source,
        }
    }

    /// Create a validation error with the given message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Check if this error can clear up without anyone editing a resource
    ///
    /// Missing dependencies and template failures are still requeued by the
    /// error policy, since the fix arrives as a resource change.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Kube(source) => match source {
                kube::Error::Api(ae) => {
                    !(400..500).contains(&ae.code) || matches!(ae.code, 404 | 409 | 429)
                }
                _ => true,
            },
            Error::DependencyMissing { .. } => true,
            Error::Template { .. } => true,
            Error::Validation(_) => false,
        }
    }

    /// Short tag naming the failure class, used as a log field
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Kube(_) => "kube",
            Error::DependencyMissing { .. } => "dependency-missing",
            Error::Template { .. } => "template",
            Error::Validation(_) => "validation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(code: u16) -> kube::Error {
        kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".to_string(),
            message: "boom".to_string(),
            reason: "Test".to_string(),
            code,
        })
    }

    /// Story: a missing dependency names exactly what the controller looked for
    #[test]
    fn story_missing_dependency_names_the_resource() {
        let err = Error::dependency_missing("ObjectVersion", "default", "nginx-v1");
        assert_eq!(err.to_string(), "ObjectVersion default/nginx-v1 not found");
        assert!(err.is_retryable());
        assert_eq!(err.kind(), "dependency-missing");
    }

    /// Story: template failures carry the ObjectVersion they came from
    #[test]
    fn story_template_failure_is_scoped_to_object() {
        let decode = serde_yaml::from_str::<serde_json::Value>("a: [1, 2")
            .expect_err("unterminated flow sequence should not decode");
        let err = Error::template("web", TemplateError::Decode(decode));

        assert!(err.to_string().contains("ObjectVersion web"));
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.is_retryable());
    }

    /// Story: malformed resources need a human, not another attempt
    #[test]
    fn story_validation_errors_are_not_retryable() {
        assert!(!Error::validation("bad apiVersion").is_retryable());
        assert_eq!(Error::validation("x").kind(), "validation");
    }

    #[test]
    fn test_kube_error_retryability() {
        assert!(Error::from(api_error(500)).is_retryable());
        assert!(Error::from(api_error(409)).is_retryable());
        assert!(Error::from(api_error(429)).is_retryable());
        assert!(Error::from(api_error(404)).is_retryable());
        assert!(!Error::from(api_error(422)).is_retryable());
        assert!(!Error::from(api_error(403)).is_retryable());
    }
}

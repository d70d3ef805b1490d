use miette::Diagnostic;
use thiserror::Error;

/// Errors produced while normalizing raw provider JSON into typed records or
/// deterministic snippets. These never carry an upstream HTTP status; by the
/// time data reaches this crate it has already left the transport layer.
#[derive(Debug, Error, Diagnostic)]
pub enum CoreError {
    #[error("malformed {entity} payload: {reason}")]
    Malformed { entity: &'static str, reason: String },

    #[error("{entity} is missing required field `{field}`")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },

    #[error("configuration validation failed:\n{}", .missing.iter().map(|m| format!("  - {m}")).collect::<Vec<_>>().join("\n"))]
    Configuration { missing: Vec<String> },

    #[error("secret reference `{reference}` could not be resolved")]
    SecretResolution {
        reference: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

use miette::Diagnostic;
use thiserror::Error;

/// Upstream errors (§7): `Transient` is retried by [`crate::retry`], every
/// other variant is handed back to the caller to log and skip.
#[derive(Debug, Error, Diagnostic)]
pub enum PlayHqError {
    #[error("error executing request to upstream provider")]
    RequestExecute(#[source] reqwest::Error),

    #[error("upstream provider returned transient status {status}")]
    Transient { status: u16 },

    #[error("upstream provider returned permanent status {status}: {body}")]
    Permanent { status: u16, body: String },

    #[error("error deserializing upstream response body")]
    ReadBody(#[source] reqwest::Error),

    #[error("error deserializing upstream response structure")]
    Deserialize(#[source] serde_json::Error),

    #[error("upstream call exceeded its deadline")]
    Timeout,
}

//! Typed failures at the answer boundary.
//!
//! Adapters and the dispatcher return [`AnswerError`] values; the fixed
//! user-facing wording lives here and is rendered exactly once, at the
//! presentation edge. Nothing deeper in the stack formats reply strings for
//! failures, so the transport layer and the tests share a single source of
//! truth for the text.

use thiserror::Error;

/// Result alias used across adapters and the dispatcher.
pub type AnswerResult<T> = Result<T, AnswerError>;

/// Failure kinds that can surface from requirement lookup or answer
/// computation.
#[derive(Debug, Clone, Error)]
pub enum AnswerError {
    /// The query id is missing, malformed, unknown, or owned by no adapter.
    #[error("query not supported")]
    Unsupported,
    /// The parameter map lacks a declared requirement.
    #[error("missing required parameter '{0}'")]
    MissingParameter(String),
    /// A parameter is present but unusable.
    #[error("invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },
    /// The remote source answered, but nothing matched the request.
    #[error("{subject} not found")]
    NotFound { subject: String, reference: String },
    /// The call to the remote source itself failed. The detail is for logs,
    /// never for users.
    #[error("upstream failure while fetching {subject}: {detail}")]
    Upstream {
        subject: String,
        reference: String,
        detail: String,
    },
}

impl AnswerError {
    /// Fixed reply for the requirements operation when the query id cannot
    /// be resolved.
    pub const UNSUPPORTED_QUERY: &'static str =
        "Sorry, that query is not supported. Try again with a supported query ID.";

    /// Fixed reply for the answer operation when no answer can be produced
    /// for the query id.
    pub const RESPONSE_NOT_FOUND: &'static str = "Response not found.";

    pub fn not_found(subject: impl Into<String>, reference: impl Into<String>) -> Self {
        Self::NotFound {
            subject: subject.into(),
            reference: reference.into(),
        }
    }

    pub fn upstream(
        subject: impl Into<String>,
        reference: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::Upstream {
            subject: subject.into(),
            reference: reference.into(),
            detail: detail.into(),
        }
    }

    /// User-facing wording for the answer operation. Upstream failures and
    /// empty results render identically: users get a pointer to the help
    /// reference, not transport detail.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unsupported => Self::RESPONSE_NOT_FOUND.to_string(),
            Self::MissingParameter(name) => format!("Missing required parameter '{name}'."),
            Self::InvalidParameter { name, reason } => {
                format!("Invalid value for parameter '{name}': {reason}.")
            }
            Self::NotFound { subject, reference }
            | Self::Upstream {
                subject, reference, ..
            } => {
                format!("Sorry, I could not find {subject}. Please try again or refer to {reference}.")
            }
        }
    }

    /// User-facing wording for the requirements operation. Only the
    /// unresolved-query wording differs from [`Self::user_message`].
    pub fn requirements_message(&self) -> String {
        match self {
            Self::Unsupported => Self::UNSUPPORTED_QUERY.to_string(),
            other => other.user_message(),
        }
    }
}

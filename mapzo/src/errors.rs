use std::borrow::Cow;

use thiserror::Error;

/// Top-level error type returned by Mapzo controllers and gateways.
#[derive(Debug, Error)]
pub enum AppError {
    /// Validation failed for one or more form fields.
    #[error("validation failed")]
    Validation(#[from] ValidationError),

    /// The action needs a signed-in session and none is present.
    #[error("not signed in")]
    Unauthenticated,

    /// Target record was not found on the remote side.
    #[error("entity not found")]
    NotFound { entity_id: Option<String> },

    /// Invalid input supplied to a gateway operation.
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// A hosted platform call failed (auth, database, realtime).
    #[error("{operation} failed: {message}")]
    Remote { operation: &'static str, message: String },

    /// Storage upload was rejected or failed.
    #[error("upload failed: {message}")]
    Upload { message: String },

    /// An operation with an explicit deadline ran past it.
    #[error("{operation} timed out")]
    Timeout { operation: &'static str },

    /// Configuration could not be read or is inconsistent.
    #[error("config error: {message}")]
    Config { message: String },

    /// Anything else.
    #[error("{message}")]
    Other { message: Cow<'static, str> },
}

impl AppError {
    pub fn remote(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Remote {
            operation,
            message: message.into(),
        }
    }

    pub fn not_found(entity_id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_id: Some(entity_id.into()),
        }
    }

    /// Short human-readable text for inline errors and toasts.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(err) => err
                .issues
                .first()
                .map(|issue| issue.message.clone())
                .unwrap_or_else(|| "Please check the form".to_string()),
            AppError::Unauthenticated => "Please sign in to continue".to_string(),
            AppError::NotFound { .. } => "Not found".to_string(),
            AppError::InvalidRequest { message } => message.clone(),
            AppError::Remote { message, .. } => format!("Error: {message}"),
            AppError::Upload { message } => format!("Upload failed: {message}"),
            AppError::Timeout { .. } => "Request timed out. Try again.".to_string(),
            AppError::Config { message } => message.clone(),
            AppError::Other { message } => message.to_string(),
        }
    }
}

/// Collection of validation issues encountered while checking a form.
#[derive(Debug, Error)]
#[error("validation errors: {issues:?}")]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new<I>(issues: I) -> Self
    where
        I: IntoIterator<Item = ValidationIssue>,
    {
        Self {
            issues: issues.into_iter().collect(),
        }
    }

    /// Convenience helper for constructing a single-field validation error.
    pub fn single(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new([ValidationIssue::new(field, code, message)])
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// First issue reported for `field`, if any.
    pub fn for_field(&self, field: &str) -> Option<&ValidationIssue> {
        self.issues.iter().find(|issue| issue.field == field)
    }
}

/// Detailed validation failure for a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

pub type ValidationResult<T> = Result<T, ValidationError>;

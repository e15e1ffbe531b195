//! Error types for recmerge-web
//!
//! Every failure in the wizard ends the current run: the handler boundary turns
//! it into a flash message plus a redirect back to the upload form.

use axum::{
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::session::{self, SessionError};
use crate::store::StoreError;

/// Wizard error taxonomy
#[derive(Debug, Error)]
pub enum WizardError {
    /// An upload could not be read or parsed
    #[error("Unable to read the {file} file: {reason}")]
    Input { file: String, reason: String },

    /// A required form field is missing or invalid
    #[error("{0}")]
    InvalidField(String),

    /// The matcher failed
    #[error("Matching failed: {0}")]
    Matcher(String),

    /// The operation could not be saved, found or restored
    #[error("{0}")]
    Persistence(String),

    /// The resolution form carried a value outside the allowed choices
    #[error("Invalid form data: {0}")]
    InvalidSubmission(String),

    /// The merged output could not be produced
    #[error("Unable to produce the output file: {0}")]
    Output(String),
}

impl WizardError {
    pub fn input(file: &str, reason: impl ToString) -> Self {
        WizardError::Input {
            file: file.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Short machine-readable category, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            WizardError::Input { .. } => "input",
            WizardError::InvalidField(_) => "invalid_field",
            WizardError::Matcher(_) => "matcher",
            WizardError::Persistence(_) => "persistence",
            WizardError::InvalidSubmission(_) => "invalid_submission",
            WizardError::Output(_) => "output",
        }
    }
}

impl From<StoreError> for WizardError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => WizardError::Persistence(
                "This comparison has already been used or has expired. Please start again."
                    .to_string(),
            ),
            other => WizardError::Persistence(format!("Unable to access the saved comparison: {}", other)),
        }
    }
}

impl From<SessionError> for WizardError {
    fn from(err: SessionError) -> Self {
        WizardError::Persistence(format!("{}. Please start again.", err))
    }
}

impl IntoResponse for WizardError {
    fn into_response(self) -> Response {
        tracing::warn!(kind = self.kind(), error = %self, "Request failed, redirecting to start");

        (
            [(header::SET_COOKIE, session::flash_cookie(&self.to_string()))],
            Redirect::to("/"),
        )
            .into_response()
    }
}

/// Result type for wizard handlers
pub type WizardResult<T> = Result<T, WizardError>;

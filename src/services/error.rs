//! Service error types

use thiserror::Error;

use crate::api::{ApiError, GENERIC_ERROR_MESSAGE};
use super::session::StoreError;
use super::validation::ValidationErrors;

/// Rejections raised by multi-step flows before any request is sent
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("Please first verify the email address.")]
    EmailNotVerified,

    #[error("Please request a verification code first.")]
    OtpNotRequested,

    #[error("Email address does not match the verified email address.")]
    EmailMismatch,

    #[error("Please complete the account details first.")]
    StepOneIncomplete,

    #[error("Please login to continue.")]
    NotAuthenticated,

    #[error("Nothing to submit, the form was discarded.")]
    Discarded,
}

/// Image upload failures
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("You can only upload image file like png, jpg, jpeg or svg")]
    UnsupportedType(String),

    #[error("Invalid file size, size must be less than or equal to 2 MB.")]
    TooLarge { size: u64, max: u64 },

    #[error("Cover image is required")]
    MissingImage,

    /// The presign request itself failed
    #[error("Failed to get upload URL: {0}")]
    Presign(#[source] ApiError),

    /// The byte transfer to object storage failed
    #[error("try again file not uploaded.")]
    Transfer(#[source] ApiError),
}

impl UploadError {
    pub fn user_message(&self) -> String {
        match self {
            UploadError::Presign(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

/// Error returned by every service entry point
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Request already in progress")]
    AlreadyPending,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    /// Text to surface to the creator
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Api(e) => e.user_message(),
            ServiceError::Upload(e) => e.user_message(),
            ServiceError::Validation(e) => e.to_string(),
            ServiceError::Flow(e) => e.to_string(),
            ServiceError::AlreadyPending => self.to_string(),
            ServiceError::Store(_) | ServiceError::Internal(_) => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }

    /// The server rejected the bearer token
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ServiceError::Api(e) if e.is_unauthorized())
    }
}

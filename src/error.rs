use thiserror::Error;

/// Message shown to users whenever the verification backend cannot be reached.
pub const UNAVAILABLE_MESSAGE: &str =
    "I'm having trouble connecting to my verification databases. Please try again.";

#[derive(Error, Debug)]
pub enum VerifyError {
    /// Transport failure or non-success status from the model API.
    /// `reason` is for logs only; `Display` is the user-facing message.
    #[error("{}", UNAVAILABLE_MESSAGE)]
    Unavailable { reason: String },

    #[error("Send me a forwarded message or a screenshot to verify.")]
    EmptySubmission,

    #[error("The attached image could not be read: {reason}")]
    InvalidImage { reason: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl VerifyError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn invalid_image(reason: impl Into<String>) -> Self {
        Self::InvalidImage {
            reason: reason.into(),
        }
    }

    /// True when the submission itself was at fault, as opposed to the backend.
    pub fn is_user_input(&self) -> bool {
        matches!(self, Self::EmptySubmission | Self::InvalidImage { .. })
    }
}

pub type Result<T> = std::result::Result<T, VerifyError>;

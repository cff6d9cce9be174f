//! Error types for E2E testing

use thiserror::Error;
use xyzbank_common::ConfigError;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Setup failed: {0}")]
    Setup(String),

    #[error("Application not reachable at {url} after {attempts} attempts")]
    Preflight { url: String, attempts: usize },

    #[error("Browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Attachment failed: {0}")]
    Attachment(String),

    #[error("Test not found: {0}")]
    UnknownTest(String),

    #[error("No test tagged: {0}")]
    UnknownTag(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Unexpected page content: {0}")]
    UnexpectedContent(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl E2eError {
    /// Category name recorded in failure reports
    pub fn kind(&self) -> &'static str {
        match self {
            E2eError::Config(_) => "ConfigurationError",
            E2eError::Setup(_) | E2eError::Preflight { .. } => "SetupError",
            E2eError::Browser(_) => "BrowserError",
            E2eError::ElementNotFound(_) => "ElementNotFound",
            E2eError::AssertionFailed(_) => "AssertionFailure",
            E2eError::Attachment(_) => "AttachmentError",
            E2eError::UnknownTest(_) | E2eError::UnknownTag(_) => "UnknownTest",
            E2eError::Timeout(_) => "Timeout",
            E2eError::UnexpectedContent(_) => "UnexpectedContent",
            E2eError::Io(_) => "IoError",
            E2eError::Json(_) => "JsonError",
            E2eError::Http(_) => "HttpError",
        }
    }

    /// Message without the category prefix
    pub fn detail(&self) -> String {
        match self {
            E2eError::Setup(msg)
            | E2eError::ElementNotFound(msg)
            | E2eError::AssertionFailed(msg)
            | E2eError::Attachment(msg)
            | E2eError::UnknownTest(msg)
            | E2eError::UnknownTag(msg)
            | E2eError::Timeout(msg)
            | E2eError::UnexpectedContent(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

pub type E2eResult<T> = Result<T, E2eError>;

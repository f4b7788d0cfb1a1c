//! Error types for the browser collaborators

use thiserror::Error;
use webinstall_core::InstallError;

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("Playwright not found. Install with: npm install playwright && npx playwright install")]
    PlaywrightNotFound,

    #[error("Bridge failed to start: {0}")]
    Startup(String),

    #[error("Bridge process exited")]
    Closed,

    #[error("Playwright error during {op}: {message}")]
    Command { op: &'static str, message: String },

    #[error("Unexpected reply to {op}: {value}")]
    UnexpectedReply { op: &'static str, value: serde_json::Value },

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type BrowserResult<T> = Result<T, BrowserError>;

impl From<BrowserError> for InstallError {
    fn from(err: BrowserError) -> Self {
        match err {
            BrowserError::Io(e) => InstallError::Io(e),
            BrowserError::Json(e) => InstallError::Json(e),
            BrowserError::Http(e) => InstallError::Probe(e.to_string()),
            other => InstallError::Driver(other.to_string()),
        }
    }
}

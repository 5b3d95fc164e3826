use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Failed to open process memory: {0}")]
    ProcessMemoryReadDenied(String),

    #[error("Failed to read process memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("Invalid remote address: {0:#010x}")]
    InvalidAddress(u32),

    #[error("Malformed layout: {0}")]
    MalformedLayout(String),

    #[error("Unknown game version: {0}")]
    UnknownVersion(String),

    #[error("Reader cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Errors that are expected while the game is starting, closing or loading
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::ProcessNotFound(_)
                | Error::ProcessMemoryReadDenied(_)
                | Error::MemoryReadFailed { .. }
                | Error::InvalidAddress(_)
        )
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedLayout(message.into())
    }
}

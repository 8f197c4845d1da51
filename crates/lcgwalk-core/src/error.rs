use thiserror::Error;

/// Errors surfaced by generation, the test battery, and result parsing.
///
/// Every variant is returned to the caller. Invalid statistical parameters are
/// never replaced with defaults.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed or out-of-domain numeric input.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A test identifier outside the fixed set of six.
    #[error("unknown test: {0}")]
    UnknownTest(String),

    /// A serialized result that cannot be read back.
    #[error("malformed result: {0}")]
    MalformedResult(String),
}

impl Error {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

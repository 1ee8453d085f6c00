use std::{io::ErrorKind, path::PathBuf};
use teloxide::RequestError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] tokio::io::Error),

    #[error("missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("unsupported url: {0}")]
    InvalidUrl(String),

    #[error("yt-dlp failed: {0}")]
    YtdlpFailed(String),

    #[error("requested format is not available: {0}")]
    FormatUnavailable(String),

    #[error("{tool} exited with code {code:?}: {stderr}")]
    ToolFailed {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("no media found at {}", .0.display())]
    NoMediaFound(PathBuf),

    #[error("unknown media kind: {0}")]
    UnknownMediaKind(String),

    #[error("compression failed: {0}")]
    CompressionFailed(String),

    #[error("teloxide error: {0}")]
    Teloxide(#[from] RequestError),

    #[error("other: {0}")]
    Other(String),
}

impl Error {
    #[inline]
    pub fn other(text: impl Into<String>) -> Self {
        Self::Other(text.into())
    }

    #[inline]
    pub fn ytdlp_failed(stderr: impl Into<String>) -> Self {
        Self::YtdlpFailed(stderr.into())
    }

    #[inline]
    pub fn compression_failed(reason: impl Into<String>) -> Self {
        Self::CompressionFailed(reason.into())
    }

    /// Whether this error means the transfer ran out of time.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Teloxide(RequestError::Network(err)) => err.is_timeout(),
            Self::Io(err) => err.kind() == ErrorKind::TimedOut,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

use std::io;
use thiserror::Error;

/// Errors produced by a [`MultipartWriter`](crate::MultipartWriter) session.
///
/// `InvalidArgument` is always raised before a single byte reaches the sink.
/// `Io` leaves the sink in a partially written state, the session must be abandoned.
/// `Closed` marks a usage error: the session already wrote its closing boundary.
#[derive(Error, Debug)]
pub enum MultipartError {
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("multipart session already closed")]
    Closed,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl MultipartError {
    pub fn invalid_argument<S: ToString>(str: S) -> Self {
        Self::InvalidArgument { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// Returns true if the error was raised by argument validation
    #[inline]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }

    /// Returns true if the error was caused by using a closed session
    #[inline]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns true if the error came from the sink or the byte source
    #[inline]
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

use std::io;
use std::time::Duration;

use micro_multipart::MultipartError;
use thiserror::Error;

/// Every failure a request can end with.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid url: {reason}")]
    InvalidUrl { reason: String },

    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("invalid pattern: {source}")]
    InvalidPattern {
        #[from]
        source: regex::Error,
    },

    #[error("too many redirects, the limit is {max}")]
    TooManyRedirects { max: usize },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: SendError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: ParseError,
    },

    #[error("form error: {source}")]
    FormError {
        #[from]
        source: MultipartError,
    },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ClientError {
    pub fn invalid_url<S: ToString>(str: S) -> Self {
        Self::InvalidUrl { reason: str.to_string() }
    }

    pub fn invalid_request<S: ToString>(str: S) -> Self {
        Self::InvalidRequest { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Failures while decoding a response.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid http version: {0:?}")]
    InvalidVersion(Option<u8>),

    #[error("invalid status code")]
    InvalidStatus,

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

/// Failures while encoding a request.
#[derive(Error, Debug)]
pub enum SendError {
    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

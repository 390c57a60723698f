//! Parsing of response heads.
//!
//! The decoder parses the status line and header block with `httparse`, skips
//! interim `1xx` responses and works out how the body that follows is framed.
//!
//! # Limits
//!
//! - Maximum number of headers: 64
//! - Maximum head size: 8KB
//! - HTTP/1.0 and HTTP/1.1 only

use bytes::{Buf, BytesMut};
use http::{HeaderName, HeaderValue, Method, Response, StatusCode, Version, header};
use httparse::{Error, Status};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::protocol::{ParseError, PayloadSize, ResponseHeader};
use crate::utils::ensure;

/// Maximum number of headers allowed in a response
const MAX_HEADER_NUM: usize = 64;

/// Maximum size in bytes allowed for the entire head
const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Decoder for the head of a response to a request sent with a known method.
///
/// The method matters: a response to `HEAD` announces a body it never sends.
#[derive(Debug, Clone)]
pub struct HeaderDecoder {
    method: Method,
}

impl HeaderDecoder {
    pub fn new(method: Method) -> Self {
        Self { method }
    }
}

impl Decoder for HeaderDecoder {
    type Item = (ResponseHeader, PayloadSize);
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let Some((header, body_offset)) = parse_head(src)? else {
                return Ok(None);
            };
            src.advance(body_offset);

            let status = header.status();
            if status.is_informational() && status != StatusCode::SWITCHING_PROTOCOLS {
                trace!(%status, "skip interim response");
                continue;
            }

            let payload_size = parse_payload(&header, &self.method)?;
            trace!(%status, ?payload_size, "parsed response head");
            return Ok(Some((header, payload_size)));
        }
    }
}

fn parse_head(src: &[u8]) -> Result<Option<(ResponseHeader, usize)>, ParseError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
    let mut res = httparse::Response::new(&mut headers);

    let parsed = res.parse(src).map_err(|e| match e {
        Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
        e => ParseError::invalid_header(e.to_string()),
    })?;

    let body_offset = match parsed {
        Status::Complete(body_offset) => body_offset,
        Status::Partial => {
            ensure!(src.len() <= MAX_HEADER_BYTES, ParseError::too_large_header(src.len(), MAX_HEADER_BYTES));
            return Ok(None);
        }
    };
    ensure!(body_offset <= MAX_HEADER_BYTES, ParseError::too_large_header(body_offset, MAX_HEADER_BYTES));

    let version = match res.version {
        Some(0) => Version::HTTP_10,
        Some(1) => Version::HTTP_11,
        v => return Err(ParseError::InvalidVersion(v)),
    };
    let status = res.code.and_then(|code| StatusCode::from_u16(code).ok()).ok_or(ParseError::InvalidStatus)?;

    let mut response = Response::new(());
    *response.status_mut() = status;
    *response.version_mut() = version;

    let header_map = response.headers_mut();
    header_map.reserve(res.headers.len());
    for h in res.headers.iter() {
        let name = HeaderName::from_bytes(h.name.as_bytes()).map_err(ParseError::invalid_header)?;
        let value = HeaderValue::from_bytes(h.value).map_err(ParseError::invalid_header)?;
        header_map.append(name, value);
    }

    Ok(Some((response.into(), body_offset)))
}

/// Works out the body framing of a response, see RFC 9112 section 6.3.
fn parse_payload(header: &ResponseHeader, method: &Method) -> Result<PayloadSize, ParseError> {
    if !header.has_body(method) {
        return Ok(PayloadSize::Empty);
    }

    let te_header = header.headers().get(header::TRANSFER_ENCODING);
    let cl_header = header.headers().get(header::CONTENT_LENGTH);

    match (te_header, cl_header) {
        (None, None) => Ok(PayloadSize::UntilClose),

        (Some(te_value), None) => {
            if is_chunked(te_value) {
                Ok(PayloadSize::Chunked)
            } else {
                Ok(PayloadSize::UntilClose)
            }
        }

        (None, Some(cl_value)) => {
            let cl_str = cl_value.to_str().map_err(|_| ParseError::invalid_content_length("value can't to_str"))?;
            let length = cl_str
                .trim()
                .parse::<u64>()
                .map_err(|_| ParseError::invalid_content_length(format!("value {cl_str} is not u64")))?;
            Ok(PayloadSize::Length(length))
        }

        (Some(_), Some(_)) => Err(ParseError::invalid_content_length("transfer-encoding and content-length both present in headers")),
    }
}

/// chunked must be the last transfer coding when present
fn is_chunked(value: &HeaderValue) -> bool {
    value.as_bytes().rsplit(|b| *b == b',').next().is_some_and(|last| last.trim_ascii().eq_ignore_ascii_case(b"chunked"))
}

//! Serialization of request heads.
//!
//! Writes the request line and header block of a [`RequestHead`], setting the
//! framing headers (`Content-Length` or `Transfer-Encoding`) from the
//! [`PayloadSize`] of the body that follows.

use std::io;
use std::io::ErrorKind;

use bytes::{BufMut, BytesMut};
use http::{HeaderValue, Method, Version, header};
use tokio_util::codec::Encoder;
use tracing::error;

use crate::protocol::{PayloadSize, RequestHead, SendError};

/// Initial buffer size allocated for a request head
const INIT_HEADER_SIZE: usize = 1024;

const CHUNKED: HeaderValue = HeaderValue::from_static("chunked");
const ZERO: HeaderValue = HeaderValue::from_static("0");

/// Encoder for request heads.
#[derive(Debug)]
pub struct HeaderEncoder;

impl Encoder<(RequestHead, PayloadSize)> for HeaderEncoder {
    type Error = SendError;

    fn encode(&mut self, item: (RequestHead, PayloadSize), dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (mut head, payload_size) = item;

        if head.version() != Version::HTTP_11 {
            error!(http_version = ?head.version(), "unsupported http version");
            return Err(io::Error::from(ErrorKind::Unsupported).into());
        }

        let expects_body = expects_body(head.method());
        let headers = head.headers_mut();
        match payload_size {
            PayloadSize::Length(n) => {
                headers.remove(header::TRANSFER_ENCODING);
                headers.insert(header::CONTENT_LENGTH, n.into());
            }
            PayloadSize::Chunked => {
                headers.remove(header::CONTENT_LENGTH);
                headers.insert(header::TRANSFER_ENCODING, CHUNKED);
            }
            PayloadSize::Empty => {
                headers.remove(header::TRANSFER_ENCODING);
                if expects_body {
                    headers.insert(header::CONTENT_LENGTH, ZERO);
                } else {
                    headers.remove(header::CONTENT_LENGTH);
                }
            }
            PayloadSize::UntilClose => {
                error!("request body can't be delimited by closing the connection");
                return Err(SendError::invalid_body("request body needs a length or chunked framing"));
            }
        }

        dst.reserve(INIT_HEADER_SIZE);
        dst.put_slice(head.method().as_str().as_bytes());
        dst.put_u8(b' ');
        match head.uri().path() {
            "" => dst.put_u8(b'/'),
            path => dst.put_slice(path.as_bytes()),
        }
        if let Some(query) = head.uri().query() {
            dst.put_u8(b'?');
            dst.put_slice(query.as_bytes());
        }
        dst.put_slice(b" HTTP/1.1\r\n");

        for (header_name, header_value) in head.headers() {
            dst.put_slice(header_name.as_ref());
            dst.put_slice(b": ");
            dst.put_slice(header_value.as_ref());
            dst.put_slice(b"\r\n");
        }
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

/// Methods whose requests are expected to announce a body, even an empty one
fn expects_body(method: &Method) -> bool {
    method == Method::POST || method == Method::PUT || method == Method::PATCH
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Request;

    fn encode(head: RequestHead, payload_size: PayloadSize) -> String {
        let mut dst = BytesMut::new();
        HeaderEncoder.encode((head, payload_size), &mut dst).unwrap();
        String::from_utf8(dst.to_vec()).unwrap()
    }

    #[test]
    fn get_without_body() {
        let head = Request::get("http://example.com/search?q=rust").header("host", "example.com").body(()).unwrap();

        assert_eq!(encode(head, PayloadSize::Empty), "GET /search?q=rust HTTP/1.1\r\nhost: example.com\r\n\r\n");
    }

    #[test]
    fn root_path() {
        let head = Request::get("http://example.com").body(()).unwrap();

        assert_eq!(encode(head, PayloadSize::Empty), "GET / HTTP/1.1\r\n\r\n");
    }

    #[test]
    fn post_with_length() {
        let head = Request::post("http://example.com/form").header("transfer-encoding", "chunked").body(()).unwrap();

        assert_eq!(encode(head, PayloadSize::Length(11)), "POST /form HTTP/1.1\r\ncontent-length: 11\r\n\r\n");
    }

    #[test]
    fn empty_post_announces_zero_length() {
        let head = Request::post("http://example.com/").body(()).unwrap();

        assert_eq!(encode(head, PayloadSize::Empty), "POST / HTTP/1.1\r\ncontent-length: 0\r\n\r\n");
    }

    #[test]
    fn chunked_replaces_length() {
        let head = Request::post("http://example.com/upload").header("content-length", "5").body(()).unwrap();

        assert_eq!(encode(head, PayloadSize::Chunked), "POST /upload HTTP/1.1\r\ntransfer-encoding: chunked\r\n\r\n");
    }

    #[test]
    fn close_delimited_request_is_rejected() {
        let head = Request::post("http://example.com/").body(()).unwrap();
        let mut dst = BytesMut::new();

        let result = HeaderEncoder.encode((head, PayloadSize::UntilClose), &mut dst);

        assert!(matches!(result, Err(SendError::InvalidBody { .. })));
        assert!(dst.is_empty());
    }

    #[test]
    fn http2_is_unsupported() {
        let head = Request::get("http://example.com/").version(Version::HTTP_2).body(()).unwrap();
        let mut dst = BytesMut::new();

        assert!(matches!(HeaderEncoder.encode((head, PayloadSize::Empty), &mut dst), Err(SendError::Io { .. })));
    }
}

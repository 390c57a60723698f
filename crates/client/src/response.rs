//! The completed response of a request.

use bytes::Bytes;
use http::header::{AsHeaderName, CONTENT_LENGTH, CONTENT_TYPE, SET_COOKIE};
use http::{HeaderMap, StatusCode, Uri};
use mime::Mime;

use crate::protocol::ResponseHeader;

/// A response read to the end, with its body kept in memory.
#[derive(Debug)]
pub struct HttpResponse {
    uri: Uri,
    header: ResponseHeader,
    body: Bytes,
    text: Option<String>,
}

impl HttpResponse {
    /// `uri` is the address that produced this response, after redirects.
    /// The body is also decoded as text when its content type matches one of
    /// `text_types`, or when the response doesn't name a content type.
    pub fn new(uri: Uri, header: ResponseHeader, body: Bytes, text_types: &[String]) -> Self {
        let is_text = match header.headers().get(CONTENT_TYPE).and_then(|value| value.to_str().ok()) {
            Some(content_type) => content_type.parse::<Mime>().is_ok_and(|mime| is_text_type(&mime, text_types)),
            None => true,
        };
        let text = is_text.then(|| String::from_utf8_lossy(&body).into_owned());

        Self { uri, header, body, text }
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn status(&self) -> StatusCode {
        self.header.status()
    }

    /// The numeric status code
    pub fn response_code(&self) -> u16 {
        self.header.status().as_u16()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.header.headers()
    }

    /// Every value of the header `name`, in received order. Values that aren't
    /// visible ASCII are skipped.
    pub fn response_header<K: AsHeaderName>(&self, name: K) -> Vec<&str> {
        self.headers().get_all(name).iter().filter_map(|value| value.to_str().ok()).collect()
    }

    /// Values of the cookie `name` set by this response through `Set-Cookie`.
    pub fn cookie_values(&self, name: &str) -> Vec<&str> {
        self.response_header(SET_COOKIE)
            .into_iter()
            .filter_map(|set_cookie| {
                let pair = set_cookie.split(';').next()?;
                let (cookie_name, value) = pair.split_once('=')?;
                (cookie_name.trim() == name).then_some(value.trim())
            })
            .collect()
    }

    /// The announced `Content-Length`, or the received body size without one.
    pub fn content_size(&self) -> u64 {
        self.headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(self.body.len() as u64)
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The body as text, present when the content type is a text type.
    pub fn response_buffer(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn is_text(&self) -> bool {
        self.text.is_some()
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }
}

/// Matches `mime` against media ranges such as `text/*` or `application/json`.
pub(crate) fn is_text_type(mime: &Mime, text_types: &[String]) -> bool {
    text_types.iter().any(|text_type| {
        let Some((type_, subtype)) = text_type.trim().split_once('/') else {
            return false;
        };
        let type_matches = type_ == "*" || mime.type_().as_str().eq_ignore_ascii_case(type_);
        let subtype_matches = subtype == "*" || mime.subtype().as_str().eq_ignore_ascii_case(subtype);
        type_matches && subtype_matches
    })
}

//! Requests: what to send, and what to make of the response.
//!
//! A request is built with [`RequestBuilder`], whose type parameter is the
//! [`RequestKind`] deciding the result of executing it:
//!
//! - [`ReadLength`]: the size of the response body
//! - [`FetchText`]: the response body as text
//! - [`MatchRegex`]: whether the response text matches a pattern
//!
//! The body of a request is its [`Submission`]: nothing, a byte body, or
//! multipart form fields.

use std::fmt;
use std::path::PathBuf;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use mime::Mime;
use regex::Regex;
use serde::Serialize;

use crate::client::HttpClient;
use crate::config::ClientConfig;
use crate::form::FormField;
use crate::protocol::ClientError;
use crate::response::HttpResponse;
use crate::utils::ensure;

/// Turns a completed response into the result of a request.
pub trait RequestKind: fmt::Debug + Clone + Send + Sync + 'static {
    type Output;

    fn output(&self, response: &HttpResponse) -> Self::Output;
}

/// Reads the content size of the response.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadLength;

impl RequestKind for ReadLength {
    type Output = u64;

    fn output(&self, response: &HttpResponse) -> u64 {
        response.content_size()
    }
}

/// Fetches the response body as text, empty when the response isn't text.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchText;

impl RequestKind for FetchText {
    type Output = String;

    fn output(&self, response: &HttpResponse) -> String {
        response.response_buffer().unwrap_or_default().to_string()
    }
}

/// Searches the response text for a pattern.
#[derive(Debug, Clone)]
pub struct MatchRegex {
    regex: Regex,
}

impl MatchRegex {
    pub fn new(pattern: &str) -> Result<Self, ClientError> {
        Ok(Self { regex: Regex::new(pattern)? })
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

impl RequestKind for MatchRegex {
    type Output = bool;

    fn output(&self, response: &HttpResponse) -> bool {
        response.response_buffer().is_some_and(|text| self.regex.is_match(text))
    }
}

pub type ReadRequest = HttpRequest<ReadLength>;
pub type FetchRequest = HttpRequest<FetchText>;
pub type MatchRequest = HttpRequest<MatchRegex>;

/// The body sent with a request.
#[derive(Debug, Clone, Default)]
pub enum Submission {
    /// No body
    #[default]
    Get,
    /// A body already in memory, with an optional content type
    Post { body: Bytes, content_type: Option<HeaderValue> },
    /// A `multipart/form-data` body written while it is sent
    Multipart(Vec<FormField>),
}

impl Submission {
    /// The method used when the request doesn't set one
    pub fn default_method(&self) -> Method {
        match self {
            Submission::Get => Method::GET,
            Submission::Post { .. } | Submission::Multipart(_) => Method::POST,
        }
    }

    /// The content type given with a post body
    pub fn content_type(&self) -> Option<&HeaderValue> {
        match self {
            Submission::Post { content_type, .. } => content_type.as_ref(),
            Submission::Get | Submission::Multipart(_) => None,
        }
    }
}

/// The outcome of an executed request: its result and the response it came from.
#[derive(Debug)]
pub struct Outcome<T> {
    value: T,
    response: HttpResponse,
}

impl<T> Outcome<T> {
    pub(crate) fn new(value: T, response: HttpResponse) -> Self {
        Self { value, response }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn response(&self) -> &HttpResponse {
        &self.response
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn into_parts(self) -> (T, HttpResponse) {
        (self.value, self.response)
    }
}

/// A request ready to be executed, any number of times.
#[derive(Debug, Clone)]
pub struct HttpRequest<K> {
    kind: K,
    uri: Uri,
    method: Method,
    headers: HeaderMap,
    submission: Submission,
    follow_redirects: bool,
    text_types: Vec<String>,
}

impl HttpRequest<ReadLength> {
    pub fn read() -> RequestBuilder<ReadLength> {
        RequestBuilder::new(ReadLength, &ClientConfig::default())
    }
}

impl HttpRequest<FetchText> {
    pub fn fetch() -> RequestBuilder<FetchText> {
        RequestBuilder::new(FetchText, &ClientConfig::default())
    }
}

impl HttpRequest<MatchRegex> {
    pub fn matching(pattern: &str) -> RequestBuilder<MatchRegex> {
        RequestBuilder::with_kind(MatchRegex::new(pattern), &ClientConfig::default())
    }
}

impl<K: RequestKind> HttpRequest<K> {
    pub fn kind(&self) -> &K {
        &self.kind
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn submission(&self) -> &Submission {
        &self.submission
    }

    pub fn follow_redirects(&self) -> bool {
        self.follow_redirects
    }

    pub fn text_types(&self) -> &[String] {
        &self.text_types
    }

    /// Sends the request with `client`, see [`HttpClient::execute`].
    pub async fn execute(&self, client: &HttpClient) -> Result<Outcome<K::Output>, ClientError> {
        client.execute(self).await
    }
}

#[derive(Debug)]
struct Parts<K> {
    kind: K,
    uri: Option<Uri>,
    method: Option<Method>,
    headers: HeaderMap,
    submission: Submission,
    follow_redirects: bool,
    text_types: Vec<String>,
}

/// Builder of a [`HttpRequest`].
///
/// Like `http::request::Builder`, setters never fail; the first error is kept
/// and returned by [`build`](Self::build).
///
/// ```
/// use micro_client::HttpRequest;
///
/// let request = HttpRequest::fetch()
///     .url("http://localhost:8080/search?q=rust")
///     .header("accept", "text/html")
///     .build()
///     .unwrap();
///
/// assert_eq!(request.method(), "GET");
/// assert_eq!(request.uri().path(), "/search");
/// ```
#[derive(Debug)]
pub struct RequestBuilder<K> {
    inner: Result<Parts<K>, ClientError>,
}

impl<K: RequestKind> RequestBuilder<K> {
    pub(crate) fn new(kind: K, config: &ClientConfig) -> Self {
        Self::with_kind(Ok(kind), config)
    }

    pub(crate) fn with_kind(kind: Result<K, ClientError>, config: &ClientConfig) -> Self {
        let inner = kind.map(|kind| Parts {
            kind,
            uri: None,
            method: None,
            headers: HeaderMap::new(),
            submission: Submission::Get,
            follow_redirects: config.follow_redirects(),
            text_types: config.text_types().to_vec(),
        });
        Self { inner }
    }

    /// Sets the target, an absolute `http://` URL.
    pub fn url(self, url: &str) -> Self {
        self.and_then(|mut parts| {
            let uri = url.parse::<Uri>().map_err(|e| ClientError::invalid_url(format!("{url}: {e}")))?;
            check_uri(&uri)?;
            parts.uri = Some(uri);
            Ok(parts)
        })
    }

    /// Overrides the method implied by the submission.
    pub fn method(self, method: Method) -> Self {
        self.and_then(|mut parts| {
            parts.method = Some(method);
            Ok(parts)
        })
    }

    /// Appends a request header.
    pub fn header<N, V>(self, name: N, value: V) -> Self
    where
        N: TryInto<HeaderName>,
        <N as TryInto<HeaderName>>::Error: Into<http::Error>,
        V: TryInto<HeaderValue>,
        <V as TryInto<HeaderValue>>::Error: Into<http::Error>,
    {
        self.and_then(|mut parts| {
            let name = name.try_into().map_err(|e| ClientError::invalid_request(Into::<http::Error>::into(e)))?;
            let value = value.try_into().map_err(|e| ClientError::invalid_request(Into::<http::Error>::into(e)))?;
            parts.headers.append(name, value);
            Ok(parts)
        })
    }

    /// Replaces all headers set so far with `headers`.
    pub fn headers(self, headers: HeaderMap) -> Self {
        self.and_then(|mut parts| {
            parts.headers.clear();
            let mut last_name = None;
            for (name, value) in headers {
                // the iterator only yields a name for the first value of each header
                let name = match name {
                    Some(name) => last_name.insert(name).clone(),
                    None => last_name.clone().ok_or_else(|| ClientError::invalid_request("header value without name"))?,
                };
                parts.headers.append(name, value);
            }
            Ok(parts)
        })
    }

    /// Posts `body` as is. The content type is whatever the headers say.
    pub fn post_body(self, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        self.and_then(|mut parts| {
            ensure!(
                !matches!(parts.submission, Submission::Multipart(_)),
                ClientError::invalid_request("a request can't carry both form fields and a post body")
            );
            parts.submission = Submission::Post { body, content_type: None };
            Ok(parts)
        })
    }

    /// Posts `form` as `application/x-www-form-urlencoded`.
    pub fn post_form<T: Serialize + ?Sized>(self, form: &T) -> Self {
        let encoded = serde_urlencoded::to_string(form).map_err(ClientError::invalid_request);
        self.and_then(|mut parts| {
            ensure!(
                !matches!(parts.submission, Submission::Multipart(_)),
                ClientError::invalid_request("a request can't carry both form fields and a post body")
            );
            let content_type = HeaderValue::from_static("application/x-www-form-urlencoded");
            parts.submission = Submission::Post { body: Bytes::from(encoded?), content_type: Some(content_type) };
            Ok(parts)
        })
    }

    /// Adds a multipart text field.
    pub fn form_text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form_field(FormField::text(name, value))
    }

    /// Adds a multipart file field, read from `path` when the request is sent.
    pub fn form_file(self, name: impl Into<String>, mime_type: Option<Mime>, path: impl Into<PathBuf>) -> Self {
        self.form_field(FormField::file(name, mime_type, path))
    }

    pub fn form_field(self, field: FormField) -> Self {
        self.and_then(|mut parts| {
            ensure!(!field.name().is_empty(), ClientError::invalid_request("form field name must not be empty"));
            match &mut parts.submission {
                Submission::Multipart(fields) => fields.push(field),
                Submission::Get => parts.submission = Submission::Multipart(vec![field]),
                Submission::Post { .. } => {
                    return Err(ClientError::invalid_request("a request can't carry both form fields and a post body"));
                }
            }
            Ok(parts)
        })
    }

    pub fn follow_redirects(self, follow_redirects: bool) -> Self {
        self.and_then(|mut parts| {
            parts.follow_redirects = follow_redirects;
            Ok(parts)
        })
    }

    /// Adds a media range, such as `text/*`, whose bodies are read as text.
    pub fn text_type(self, text_type: impl Into<String>) -> Self {
        let text_type = text_type.into();
        self.and_then(|mut parts| {
            ensure!(text_type.contains('/'), ClientError::invalid_request(format!("{text_type} is not a media range")));
            parts.text_types.push(text_type);
            Ok(parts)
        })
    }

    pub fn build(self) -> Result<HttpRequest<K>, ClientError> {
        let parts = self.inner?;
        let uri = parts.uri.ok_or_else(|| ClientError::invalid_url("request has no url"))?;
        let method = parts.method.unwrap_or_else(|| parts.submission.default_method());

        Ok(HttpRequest {
            kind: parts.kind,
            uri,
            method,
            headers: parts.headers,
            submission: parts.submission,
            follow_redirects: parts.follow_redirects,
            text_types: parts.text_types,
        })
    }

    fn and_then<F>(self, func: F) -> Self
    where
        F: FnOnce(Parts<K>) -> Result<Parts<K>, ClientError>,
    {
        Self { inner: self.inner.and_then(func) }
    }
}

/// Only absolute `http` URLs with a host can be requested.
pub(crate) fn check_uri(uri: &Uri) -> Result<(), ClientError> {
    match uri.scheme_str() {
        Some(scheme) if scheme.eq_ignore_ascii_case("http") => {}
        Some(scheme) => return Err(ClientError::invalid_url(format!("unsupported scheme {scheme}"))),
        None => return Err(ClientError::invalid_url(format!("{uri} is not absolute"))),
    }
    ensure!(uri.host().is_some_and(|host| !host.is_empty()), ClientError::invalid_url(format!("{uri} has no host")));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_follows_submission() {
        let get = HttpRequest::fetch().url("http://localhost/").build().unwrap();
        assert_eq!(get.method(), Method::GET);

        let post = HttpRequest::fetch().url("http://localhost/").post_body("a=1").build().unwrap();
        assert_eq!(post.method(), Method::POST);

        let upload = HttpRequest::read().url("http://localhost/").form_text("k", "v").build().unwrap();
        assert_eq!(upload.method(), Method::POST);

        let put = HttpRequest::read().url("http://localhost/").post_body("x").method(Method::PUT).build().unwrap();
        assert_eq!(put.method(), Method::PUT);
    }

    #[test]
    fn first_error_wins() {
        let result = HttpRequest::fetch().url("ftp://localhost/file").header("bad header", "v").build();

        assert!(matches!(result, Err(ClientError::InvalidUrl { .. })));
    }

    #[test]
    fn invalid_header_is_deferred() {
        let result = HttpRequest::fetch().header("x-ok", "bad\r\nvalue").url("http://localhost/").build();

        assert!(matches!(result, Err(ClientError::InvalidRequest { .. })));
    }

    #[test]
    fn url_is_required() {
        assert!(matches!(HttpRequest::fetch().build(), Err(ClientError::InvalidUrl { .. })));
        assert!(matches!(HttpRequest::fetch().url("/relative").build(), Err(ClientError::InvalidUrl { .. })));
        assert!(matches!(HttpRequest::fetch().url("https://localhost/").build(), Err(ClientError::InvalidUrl { .. })));
    }

    #[test]
    fn bad_pattern_is_reported_at_build() {
        let result = HttpRequest::matching("(unclosed").url("http://localhost/").build();

        assert!(matches!(result, Err(ClientError::InvalidPattern { .. })));
    }

    #[test]
    fn form_fields_and_post_body_are_exclusive() {
        let result = HttpRequest::fetch().url("http://localhost/").form_text("a", "1").post_body("raw").build();
        assert!(result.is_err());

        let result = HttpRequest::fetch().url("http://localhost/").post_body("raw").form_text("a", "1").build();
        assert!(result.is_err());
    }

    #[test]
    fn form_fields_keep_order() {
        let request = HttpRequest::fetch()
            .url("http://localhost/upload")
            .form_text("title", "holiday")
            .form_file("photo", Some(mime::IMAGE_PNG), "/tmp/beach.png")
            .form_text("tag", "sea")
            .build()
            .unwrap();

        let Submission::Multipart(fields) = request.submission() else {
            panic!("expect multipart submission");
        };
        let names: Vec<_> = fields.iter().map(FormField::name).collect();
        assert_eq!(names, ["title", "photo", "tag"]);
    }

    #[test]
    fn url_encoded_form() {
        #[derive(Serialize)]
        struct Login<'a> {
            user: &'a str,
            remember: bool,
        }

        let request =
            HttpRequest::fetch().url("http://localhost/login").post_form(&Login { user: "zava kid", remember: true }).build().unwrap();

        let Submission::Post { body, content_type } = request.submission() else {
            panic!("expect post submission");
        };
        assert_eq!(&body[..], b"user=zava+kid&remember=true");
        assert_eq!(content_type.as_ref().unwrap(), "application/x-www-form-urlencoded");
    }

    #[test]
    fn headers_replace_and_keep_repeated_values() {
        let mut headers = HeaderMap::new();
        headers.append("accept", HeaderValue::from_static("text/html"));
        headers.append("accept", HeaderValue::from_static("application/json"));

        let request =
            HttpRequest::fetch().url("http://localhost/").header("x-dropped", "1").headers(headers).build().unwrap();

        assert_eq!(request.headers().get_all("accept").iter().count(), 2);
        assert!(!request.headers().contains_key("x-dropped"));
    }
}

//! The client facade: builds requests and runs them over fresh connections.

use std::io;

use bytes::Bytes;
use http::header::{CONNECTION, CONTENT_TYPE, HOST, LOCATION, USER_AGENT};
use http::{HeaderMap, HeaderValue, Method, Request, StatusCode, Uri};
use micro_multipart::generate_boundary;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::connection::ClientConnection;
use crate::form::{BodySink, FormField, write_form};
use crate::protocol::{ClientError, PayloadSize, RequestHead};
use crate::request::{FetchText, HttpRequest, MatchRegex, Outcome, ReadLength, RequestBuilder, RequestKind, Submission, check_uri};
use crate::response::HttpResponse;
use crate::utils::ensure;

/// Encoded form chunks in flight between the form writer and the connection
const FORM_CHANNEL_CAPACITY: usize = 4;

const DEFAULT_PORT: u16 = 80;

/// A HTTP/1.1 client.
///
/// Each exchange uses its own connection, closed once the response is read.
///
/// ```no_run
/// use micro_client::HttpClient;
///
/// # async fn run() -> Result<(), micro_client::ClientError> {
/// let client = HttpClient::default();
///
/// let request = client.match_request(r"Welcome, \w+").url("http://localhost:8080/login").post_body("user=zava").build()?;
/// let outcome = client.execute(&request).await?;
///
/// println!("{} matched: {}", outcome.response().response_code(), outcome.value());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct HttpClient {
    config: ClientConfig,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Starts a request whose result is the response content size.
    pub fn read_request(&self) -> RequestBuilder<ReadLength> {
        RequestBuilder::new(ReadLength, &self.config)
    }

    /// Starts a request whose result is the response text.
    pub fn fetch_request(&self) -> RequestBuilder<FetchText> {
        RequestBuilder::new(FetchText, &self.config)
    }

    /// Starts a request whose result tells whether the response text matches `pattern`.
    /// An invalid pattern is reported by [`RequestBuilder::build`].
    pub fn match_request(&self, pattern: &str) -> RequestBuilder<MatchRegex> {
        RequestBuilder::with_kind(MatchRegex::new(pattern), &self.config)
    }

    /// Sends `request` and reads the response, following redirects when the
    /// request allows it.
    ///
    /// A `303`, or a `301`/`302` answering a `POST`, turns the next request into a
    /// `GET` without body; other redirects repeat the request as is.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Timeout`] when one exchange exceeds the configured timeout
    /// - [`ClientError::TooManyRedirects`] past [`ClientConfig::max_redirects`]
    /// - [`ClientError::InvalidUrl`] when a redirect leads to an unsupported URL
    /// - [`ClientError::FormError`] when a form field can't be written, such as a missing file
    /// - I/O and protocol errors of the exchange
    pub async fn execute<K: RequestKind>(&self, request: &HttpRequest<K>) -> Result<Outcome<K::Output>, ClientError> {
        let timeout = self.config.timeout();
        let max_redirects = self.config.max_redirects();

        let mut uri = request.uri().clone();
        let mut method = request.method().clone();
        let mut submission = request.submission().clone();
        let mut headers = request.headers().clone();
        let mut redirects = 0;

        let response = loop {
            let exchange = self.exchange(&uri, &method, &headers, &submission, request.text_types());
            let response = tokio::time::timeout(timeout, exchange).await.map_err(|_elapsed| {
                warn!(%uri, ?timeout, "request timed out");
                ClientError::Timeout(timeout)
            })??;

            if !request.follow_redirects() {
                break response;
            }
            let location = match redirect_location(&response) {
                Some(location) => location.to_string(),
                None => break response,
            };

            ensure!(redirects < max_redirects, ClientError::TooManyRedirects { max: max_redirects });
            redirects += 1;

            let status = response.status();
            let next = resolve_location(&uri, &location)?;
            if status == StatusCode::SEE_OTHER
                || ((status == StatusCode::MOVED_PERMANENTLY || status == StatusCode::FOUND) && method == Method::POST)
            {
                method = Method::GET;
                submission = Submission::Get;
            }
            // a host set by the caller only names the original authority
            if next.authority() != uri.authority() && headers.remove(HOST).is_some() {
                debug!(to = %next, "drop host header on redirect to another authority");
            }
            debug!(%status, from = %uri, to = %next, redirects, "follow redirect");
            uri = next;
        };

        Ok(Outcome::new(request.kind().output(&response), response))
    }

    async fn exchange(
        &self,
        uri: &Uri,
        method: &Method,
        headers: &HeaderMap,
        submission: &Submission,
        text_types: &[String],
    ) -> Result<HttpResponse, ClientError> {
        check_uri(uri)?;
        let head = self.request_head(uri, method, headers, submission)?;

        let stream = TcpStream::connect(endpoint(uri)?).await?;
        stream.set_nodelay(true)?;
        let (reader, writer) = stream.into_split();
        let mut connection = ClientConnection::new(reader, writer, method.clone(), self.config.read_buffer_size());

        debug!(%method, %uri, "send request");
        match submission {
            Submission::Get => connection.send_head(head, PayloadSize::Empty).await?,
            Submission::Post { body, .. } => connection.send_body(head, body.clone()).await?,
            Submission::Multipart(fields) => send_form(&mut connection, head, fields).await?,
        }

        let (header, body) = connection.receive().await?;
        info!(%method, %uri, status = %header.status(), body_size = body.len(), "receive response");
        Ok(HttpResponse::new(uri.clone(), header, body, text_types))
    }

    fn request_head(&self, uri: &Uri, method: &Method, headers: &HeaderMap, submission: &Submission) -> Result<RequestHead, ClientError> {
        let mut head = Request::new(());
        *head.method_mut() = method.clone();
        *head.uri_mut() = uri.clone();

        let header_map = head.headers_mut();
        header_map.clone_from(headers);

        if !header_map.contains_key(HOST) {
            let host = match (uri.host(), uri.port_u16()) {
                (Some(host), Some(port)) => format!("{host}:{port}"),
                (Some(host), None) => host.to_string(),
                (None, _) => return Err(ClientError::invalid_url(format!("{uri} has no host"))),
            };
            header_map.insert(HOST, HeaderValue::from_str(&host).map_err(ClientError::invalid_url)?);
        }
        if !header_map.contains_key(USER_AGENT) {
            header_map.insert(USER_AGENT, HeaderValue::from_str(self.config.user_agent()).map_err(ClientError::invalid_request)?);
        }
        if let Some(content_type) = submission.content_type()
            && !header_map.contains_key(CONTENT_TYPE)
        {
            header_map.insert(CONTENT_TYPE, content_type.clone());
        }
        header_map.insert(CONNECTION, HeaderValue::from_static("close"));

        Ok(head)
    }
}

/// Streams `fields` as a chunked `multipart/form-data` body.
///
/// The form is written on the blocking pool, files included, while this task
/// forwards the encoded chunks. The body is only terminated when the whole form
/// was written; on failure the connection is dropped with the body unfinished.
async fn send_form<R, W>(connection: &mut ClientConnection<R, W>, mut head: RequestHead, fields: &[FormField]) -> Result<(), ClientError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let boundary = generate_boundary();
    let content_type = micro_multipart::content_type(&boundary);
    head.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_str(&content_type).map_err(ClientError::invalid_request)?);

    let (sender, mut receiver) = mpsc::channel::<Bytes>(FORM_CHANNEL_CAPACITY);
    let fields = fields.to_vec();
    // the sink owns the only sender, it must be dropped inside the task to end the loop below
    let producer = tokio::task::spawn_blocking(move || write_form(BodySink::new(sender), &boundary, &fields).map(drop));

    connection.send_head(head, PayloadSize::Chunked).await?;
    while let Some(chunk) = receiver.recv().await {
        connection.send_chunk(chunk).await?;
    }

    producer.await.map_err(|e| ClientError::io(io::Error::other(e)))??;
    connection.send_eof().await?;
    Ok(())
}

fn endpoint(uri: &Uri) -> Result<(&str, u16), ClientError> {
    let host = uri.host().ok_or_else(|| ClientError::invalid_url(format!("{uri} has no host")))?;
    let host = host.strip_prefix('[').and_then(|host| host.strip_suffix(']')).unwrap_or(host);
    Ok((host, uri.port_u16().unwrap_or(DEFAULT_PORT)))
}

fn redirect_location(response: &HttpResponse) -> Option<&str> {
    let status = response.status();
    let is_redirect = matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    );
    if !is_redirect {
        return None;
    }

    let location = response.headers().get(LOCATION).and_then(|value| value.to_str().ok());
    if location.is_none() {
        warn!(%status, "redirect without a usable location header");
    }
    location
}

/// Resolves a `Location` header value against the URI that returned it.
fn resolve_location(base: &Uri, location: &str) -> Result<Uri, ClientError> {
    let location = location.trim();
    let location = location.split('#').next().unwrap_or_default();
    let scheme = base.scheme_str().unwrap_or("http");
    let authority = base.authority().map_or("", |authority| authority.as_str());

    let target = if has_scheme(location) {
        location.to_string()
    } else if location.starts_with("//") {
        format!("{scheme}:{location}")
    } else if location.starts_with('/') {
        format!("{scheme}://{authority}{location}")
    } else if location.starts_with('?') {
        format!("{scheme}://{authority}{}{location}", base.path())
    } else {
        let base_path = base.path();
        let dir = &base_path[..base_path.rfind('/').map_or(0, |i| i + 1)];
        let dir = if dir.is_empty() { "/" } else { dir };
        format!("{scheme}://{authority}{dir}{location}")
    };

    target.parse::<Uri>().map_err(|e| ClientError::invalid_url(format!("redirect to {location}: {e}")))
}

fn has_scheme(location: &str) -> bool {
    location.split_once(':').is_some_and(|(scheme, rest)| {
        rest.starts_with("//")
            && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
            && scheme.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

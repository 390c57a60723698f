//! A small asynchronous HTTP/1.1 client
//!
//! The client sends `GET` requests, `POST` bodies and `multipart/form-data`
//! uploads, and hands back the response together with a result picked by the
//! request kind: the content size, the response text, or whether the text
//! matches a regular expression.
//!
//! # Example
//!
//! ```no_run
//! use micro_client::{ClientConfig, HttpClient};
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), micro_client::ClientError> {
//! let client = HttpClient::new(ClientConfig::new().with_timeout(Duration::from_secs(5)));
//!
//! let upload = client
//!     .fetch_request()
//!     .url("http://localhost:8080/upload")
//!     .form_text("title", "holiday")
//!     .form_file("photo", Some(mime::IMAGE_PNG), "beach.png")
//!     .build()?;
//!
//! let outcome = client.execute(&upload).await?;
//! println!("{}: {}", outcome.response().response_code(), outcome.value());
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`codec`]: request encoder and response decoder for `tokio_util` framing
//! - [`protocol`]: messages, heads and errors shared by the codecs
//! - [`connection`]: one exchange over a byte stream
//! - [`HttpClient`] / [`RequestBuilder`] / [`HttpResponse`]: the facade
//!
//! Multipart bodies are produced by `micro-multipart` on the blocking thread
//! pool and streamed with chunked transfer coding, files are never loaded whole.
//!
//! # Limitations
//!
//! Only plain `http` URLs are supported, and every exchange opens its own
//! connection.

mod client;
pub mod codec;
mod config;
pub mod connection;
mod form;
pub mod protocol;
mod request;
mod response;

mod utils;

pub use client::HttpClient;
pub use config::ClientConfig;
pub use config::DEFAULT_MAX_REDIRECTS;
pub use config::DEFAULT_READ_BUFFER_SIZE;
pub use config::DEFAULT_TIMEOUT;
pub use config::DEFAULT_USER_AGENT;
pub use form::BodySink;
pub use form::FormField;
pub use form::write_form;
pub use protocol::ClientError;
pub use request::FetchRequest;
pub use request::FetchText;
pub use request::HttpRequest;
pub use request::MatchRegex;
pub use request::MatchRequest;
pub use request::Outcome;
pub use request::ReadLength;
pub use request::ReadRequest;
pub use request::RequestBuilder;
pub use request::RequestKind;
pub use request::Submission;
pub use response::HttpResponse;

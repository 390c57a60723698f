//! HTTP/1.1 client codecs
//!
//! - [`RequestEncoder`]: request head and body, `Content-Length` or chunked framing
//! - [`ResponseDecoder`]: response head and body, `Content-Length`, chunked or
//!   close-delimited framing
//!
//! Both work on [`Message`](crate::protocol::Message)s and plug into
//! `tokio_util::codec::{FramedWrite, FramedRead}`.

mod body;
mod header;
mod request_encoder;
mod response_decoder;

pub use request_encoder::RequestEncoder;
pub use response_decoder::ResponseDecoder;

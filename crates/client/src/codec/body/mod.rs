//! Body framing
//!
//! - [`PayloadEncoder`]: request bodies, by `Content-Length` or chunked transfer coding
//! - [`PayloadDecoder`]: response bodies, by `Content-Length`, chunked transfer
//!   coding, or until the connection closes

mod chunked_decoder;
mod chunked_encoder;
mod length_decoder;
mod length_encoder;
mod payload_decoder;
mod payload_encoder;

pub use payload_decoder::PayloadDecoder;
pub use payload_encoder::PayloadEncoder;

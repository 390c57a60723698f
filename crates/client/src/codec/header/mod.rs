//! Request head encoding and response head decoding
//!
//! - [`HeaderEncoder`]: writes the request line and headers, setting the body framing headers
//! - [`HeaderDecoder`]: parses the status line and headers, choosing how the body is read

mod header_decoder;
mod header_encoder;

pub use header_decoder::HeaderDecoder;
pub use header_encoder::HeaderEncoder;

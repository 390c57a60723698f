//! A streaming `multipart/form-data` encoder
//!
//! This crate writes form posts made of text fields and file attachments in the
//! [RFC 2388](https://www.ietf.org/rfc/rfc2388.txt) wire format. Parts are framed and
//! written to any [`std::io::Write`] sink as they are added, so large attachments are
//! copied through a small fixed buffer instead of being loaded into memory.
//!
//! # Example
//!
//! ```
//! use micro_multipart::{generate_boundary, MultipartWriter};
//!
//! let boundary = generate_boundary();
//! let mut body = Vec::new();
//!
//! let mut writer = MultipartWriter::new(&mut body, boundary.as_str())?;
//! writer.write_text("title", "holiday")?;
//! writer.write_bytes("photo", Some("image/png"), "beach.png", &[0x89, b'P', b'N', b'G'])?;
//! writer.write_stream("notes", Some("text/plain"), "notes.txt", &b"sunny"[..])?;
//! let content_type = writer.content_type();
//! writer.close()?;
//!
//! assert!(content_type.starts_with("multipart/form-data; boundary="));
//! assert!(body.ends_with(format!("--{boundary}--\r\n").as_bytes()));
//! # Ok::<(), micro_multipart::MultipartError>(())
//! ```
//!
//! # Architecture
//!
//! - [`codec`]: the framing encoder turning part heads and delimiters into bytes
//! - [`MultipartWriter`]: the session driving the codec and moving bytes to the sink
//! - [`generate_boundary`] / [`content_type`]: pure helpers for the enclosing request
//!
//! # Wire Format
//!
//! Lines always end with CRLF. Each part is `--<boundary>` followed by its header
//! block, an empty line, the payload and CRLF. The body ends with `--<boundary>--`
//! and CRLF. There is no preamble and no epilogue.
//!
//! # Limitations
//!
//! Field names and file names are written literally, without quoting. Callers must
//! keep `"`, CR and LF out of them, or enable
//! [`WriterConfig::with_strict_headers`] to have such names rejected.
//!
//! A writer is a single ordered writer: every operation takes `&mut self`. Share it
//! between threads only behind external synchronization, one session per body.

mod boundary;
mod charset;
pub mod codec;
mod config;
mod error;
mod writer;

mod utils;

pub use boundary::BOUNDARY_PREFIX;
pub use boundary::content_type;
pub use boundary::content_type_mime;
pub use boundary::generate_boundary;
pub use boundary::generate_boundary_with;
pub use charset::Charset;
pub use config::DEFAULT_STREAM_BUFFER_SIZE;
pub use config::WriterConfig;
pub use error::MultipartError;
pub use writer::MultipartWriter;
pub use writer::SessionState;

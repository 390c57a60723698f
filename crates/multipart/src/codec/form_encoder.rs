//! Framing of a multipart/form-data body.
//!
//! The encoder serializes the framing items of the body (part headers, the line
//! terminator closing a part, the closing delimiter) into a [`BytesMut`]. Part
//! payloads that are already bytes can bypass the buffer; the encoder only checks
//! that items arrive in a legal order.
//!
//! # Wire Format
//!
//! ```text
//! --<boundary>\r\n
//! Content-Disposition: form-data; name="<name>"[; filename="<file name>"]\r\n
//! [Content-Type: <mime type>\r\n]
//! \r\n
//! <payload>\r\n
//! ...
//! --<boundary>--\r\n
//! ```

use bytes::{BufMut, BytesMut};
use std::io::ErrorKind;
use tokio_util::codec::Encoder;
use tracing::{error, trace};

use crate::codec::PartHead;
use crate::{Charset, MultipartError};

const CRLF: &[u8] = b"\r\n";
const DASH_DASH: &[u8] = b"--";

/// Initial buffer reserved for a part header
const INIT_HEAD_SIZE: usize = 256;

/// A framing item of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormItem<'a> {
    /// Delimiter line and header block opening a part
    Head(PartHead<'a>),
    /// Payload bytes of the current part
    Data(&'a [u8]),
    /// Line terminator closing the current part
    Tail,
    /// Closing delimiter, terminates the body
    Close,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum State {
    /// Between parts
    Idle,
    /// Header written, expecting payload or tail
    InPart,
    /// Closing delimiter written
    Closed,
}

/// Encoder for the framing of one multipart body.
#[derive(Debug, Clone)]
pub struct FormEncoder {
    boundary: String,
    charset: Charset,
    state: State,
}

impl FormEncoder {
    pub fn new(boundary: impl Into<String>, charset: Charset) -> Self {
        Self { boundary: boundary.into(), charset, state: State::Idle }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Returns true once the closing delimiter was encoded
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.state == State::Closed
    }

    /// Returns true between a `Head` and its `Tail`
    #[inline]
    pub fn in_part(&self) -> bool {
        self.state == State::InPart
    }

    fn encode_head(&self, head: &PartHead<'_>, dst: &mut BytesMut) -> Result<(), MultipartError> {
        // encode every piece before touching dst, a failure must leave dst untouched
        let name = self.charset.encode(head.name())?;
        let file_name = head.file_name().map(|file_name| self.charset.encode(file_name)).transpose()?;
        let mime_type = head.mime_type().map(|mime_type| self.charset.encode(mime_type)).transpose()?;

        dst.reserve(INIT_HEAD_SIZE);
        dst.put_slice(DASH_DASH);
        dst.put_slice(self.boundary.as_bytes());
        dst.put_slice(CRLF);

        dst.put_slice(b"Content-Disposition: form-data; name=\"");
        dst.put_slice(&name);
        dst.put_u8(b'"');
        if let Some(file_name) = file_name {
            dst.put_slice(b"; filename=\"");
            dst.put_slice(&file_name);
            dst.put_u8(b'"');
        }
        dst.put_slice(CRLF);

        if let Some(mime_type) = mime_type {
            dst.put_slice(b"Content-Type: ");
            dst.put_slice(&mime_type);
            dst.put_slice(CRLF);
        }

        dst.put_slice(CRLF);
        Ok(())
    }
}

impl<'a> Encoder<FormItem<'a>> for FormEncoder {
    type Error = MultipartError;

    fn encode(&mut self, item: FormItem<'a>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if self.state == State::Closed {
            error!(boundary = %self.boundary, "encode form item after the closing delimiter");
            return Err(MultipartError::Closed);
        }

        match item {
            FormItem::Head(head) => {
                if self.state == State::InPart {
                    error!("expect part payload or tail but receive part head");
                    return Err(MultipartError::io(ErrorKind::InvalidInput));
                }
                self.encode_head(&head, dst)?;
                trace!(name = head.name(), kind = %head.kind(), "encoded part head");
                self.state = State::InPart;
            }

            FormItem::Data(data) => {
                if self.state != State::InPart {
                    error!("expect part head but receive part payload");
                    return Err(MultipartError::io(ErrorKind::InvalidInput));
                }
                dst.extend_from_slice(data);
            }

            FormItem::Tail => {
                if self.state != State::InPart {
                    error!("expect part head but receive part tail");
                    return Err(MultipartError::io(ErrorKind::InvalidInput));
                }
                dst.put_slice(CRLF);
                self.state = State::Idle;
            }

            FormItem::Close => {
                if self.state == State::InPart {
                    error!("expect part tail but receive closing delimiter");
                    return Err(MultipartError::io(ErrorKind::InvalidInput));
                }
                dst.reserve(self.boundary.len() + 6);
                dst.put_slice(DASH_DASH);
                dst.put_slice(self.boundary.as_bytes());
                dst.put_slice(DASH_DASH);
                dst.put_slice(CRLF);
                self.state = State::Closed;
            }
        }

        Ok(())
    }
}

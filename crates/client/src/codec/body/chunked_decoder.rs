//! Decoder for `Transfer-Encoding: chunked` bodies, see RFC 9112 section 7.1.
//!
//! Chunk extensions and trailer fields are read and dropped.

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::protocol::{ParseError, PayloadItem};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedDecoder {
    state: ChunkedState,
    /// Bytes left in the current chunk, or the size read so far on a size line
    remaining: u64,
    has_size: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    /// Hex digits of the chunk size
    Size,
    /// Whitespace or extensions up to the CR of the size line
    Extension,
    SizeLf,
    Data,
    DataCr,
    DataLf,
    /// Start of a trailer line, or the CR of the final empty line
    TrailerStart,
    TrailerLine,
    TrailerLf,
    EndLf,
    End,
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        Self { state: ChunkedState::Size, remaining: 0, has_size: false }
    }

    fn next_state(&mut self, byte: u8) -> Result<ChunkedState, ParseError> {
        use ChunkedState::*;

        let next = match (self.state, byte) {
            (Size, b) if b.is_ascii_hexdigit() => {
                let digit = u64::from((b as char).to_digit(16).unwrap_or_default());
                self.remaining = self
                    .remaining
                    .checked_mul(16)
                    .and_then(|size| size.checked_add(digit))
                    .ok_or_else(|| ParseError::invalid_body("chunk size overflow"))?;
                self.has_size = true;
                Size
            }
            (Size, b';' | b' ' | b'\t') if self.has_size => Extension,
            (Size, b'\r') if self.has_size => SizeLf,
            (Size, b) => return Err(ParseError::invalid_body(format!("invalid chunk size byte {b:#04x}"))),

            (Extension, b'\r') => SizeLf,
            (Extension, b'\n') => return Err(ParseError::invalid_body("bare LF in chunk extension")),
            (Extension, _) => Extension,

            (SizeLf, b'\n') if self.remaining == 0 => TrailerStart,
            (SizeLf, b'\n') => Data,

            (DataCr, b'\r') => DataLf,
            (DataLf, b'\n') => {
                self.has_size = false;
                Size
            }

            (TrailerStart, b'\r') => EndLf,
            (TrailerStart | TrailerLine, b'\r') => TrailerLf,
            (TrailerStart | TrailerLine, _) => TrailerLine,
            (TrailerLf, b'\n') => TrailerStart,

            (EndLf, b'\n') => End,

            (state, b) => return Err(ParseError::invalid_body(format!("unexpected byte {b:#04x} in state {state:?}"))),
        };
        Ok(next)
    }
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ChunkedDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.state {
                ChunkedState::End => return Ok(Some(PayloadItem::Eof)),

                ChunkedState::Data => {
                    if src.is_empty() {
                        return Ok(None);
                    }
                    let len = usize::try_from(self.remaining).map_or(src.len(), |remaining| remaining.min(src.len()));
                    let bytes = src.split_to(len).freeze();
                    self.remaining -= len as u64;
                    if self.remaining == 0 {
                        self.state = ChunkedState::DataCr;
                    }
                    trace!(len, "decoded chunk data");
                    return Ok(Some(PayloadItem::Chunk(bytes)));
                }

                _ => {
                    if src.is_empty() {
                        return Ok(None);
                    }
                    let byte = src.get_u8();
                    self.state = self.next_state(byte)?;
                }
            }
        }
    }
}

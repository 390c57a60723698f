//! Decoding of response bodies.
//!
//! A body is framed by `Content-Length`, by chunked transfer coding, or runs
//! until the server closes the connection. The last kind is only complete at
//! end of stream, so the end of stream is handled in [`Decoder::decode_eof`].

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::codec::body::chunked_decoder::ChunkedDecoder;
use crate::codec::body::length_decoder::LengthDecoder;
use crate::protocol::{ParseError, PayloadItem, PayloadSize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadDecoder {
    kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    Length(LengthDecoder),
    Chunked(ChunkedDecoder),
    UntilClose,
    NoBody,
}

impl PayloadDecoder {
    pub fn empty() -> Self {
        Self { kind: Kind::NoBody }
    }

    pub fn chunked() -> Self {
        Self { kind: Kind::Chunked(ChunkedDecoder::new()) }
    }

    pub fn fix_length(size: u64) -> Self {
        Self { kind: Kind::Length(LengthDecoder::new(size)) }
    }

    pub fn until_close() -> Self {
        Self { kind: Kind::UntilClose }
    }

    pub fn is_chunked(&self) -> bool {
        matches!(self.kind, Kind::Chunked(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.kind, Kind::NoBody)
    }
}

impl From<PayloadSize> for PayloadDecoder {
    fn from(payload_size: PayloadSize) -> Self {
        match payload_size {
            PayloadSize::Length(size) => Self::fix_length(size),
            PayloadSize::Chunked => Self::chunked(),
            PayloadSize::UntilClose => Self::until_close(),
            PayloadSize::Empty => Self::empty(),
        }
    }
}

impl Decoder for PayloadDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match &mut self.kind {
            Kind::Length(length_decoder) => length_decoder.decode(src),
            Kind::Chunked(chunked_decoder) => chunked_decoder.decode(src),
            Kind::UntilClose if src.is_empty() => Ok(None),
            Kind::UntilClose => Ok(Some(PayloadItem::Chunk(src.split().freeze()))),
            Kind::NoBody => Ok(Some(PayloadItem::Eof)),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(item) = self.decode(src)? {
            return Ok(Some(item));
        }

        match self.kind {
            Kind::UntilClose => Ok(Some(PayloadItem::Eof)),
            _ => Err(ParseError::invalid_body("connection closed before the body was complete")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn until_close_ends_at_eof() {
        let mut decoder = PayloadDecoder::from(PayloadSize::UntilClose);
        let mut src = BytesMut::from("partial");

        assert_eq!(decoder.decode(&mut src).unwrap(), Some(PayloadItem::Chunk(Bytes::from_static(b"partial"))));
        assert_eq!(decoder.decode(&mut src).unwrap(), None);
        assert_eq!(decoder.decode_eof(&mut src).unwrap(), Some(PayloadItem::Eof));
    }

    #[test]
    fn truncated_length_body_is_an_error() {
        let mut decoder = PayloadDecoder::from(PayloadSize::Length(10));
        let mut src = BytesMut::from("short");

        assert!(decoder.decode_eof(&mut src).unwrap().is_some());
        assert!(decoder.decode_eof(&mut src).is_err());
    }

    #[test]
    fn truncated_chunked_body_is_an_error() {
        let mut decoder = PayloadDecoder::chunked();
        let mut src = BytesMut::from("5\r\nhel");

        assert!(decoder.decode_eof(&mut src).unwrap().is_some());
        assert!(decoder.decode_eof(&mut src).is_err());
    }

    #[test]
    fn no_body() {
        let mut decoder = PayloadDecoder::from(PayloadSize::Empty);
        let mut src = BytesMut::from("HTTP/1.1 200 OK");

        assert!(decoder.is_empty());
        assert_eq!(decoder.decode(&mut src).unwrap(), Some(PayloadItem::Eof));
        assert_eq!(src.len(), 15);
    }
}

//! Decoder for incoming responses.
//!
//! The decoder first yields the response head as a [`Message::Header`], then the
//! body as [`Message::Payload`] items ending with [`PayloadItem::Eof`]. The end of
//! the stream completes a close-delimited body and fails any other unfinished one.

use bytes::BytesMut;
use http::Method;
use tokio_util::codec::Decoder;

use crate::codec::body::PayloadDecoder;
use crate::codec::header::HeaderDecoder;
use crate::protocol::{Message, ParseError, PayloadItem, PayloadSize, ResponseHeader};

#[derive(Debug)]
pub struct ResponseDecoder {
    header_decoder: HeaderDecoder,
    payload_decoder: Option<PayloadDecoder>,
}

impl ResponseDecoder {
    /// Creates a decoder for the response to a request sent with `method`
    pub fn new(method: Method) -> Self {
        Self { header_decoder: HeaderDecoder::new(method), payload_decoder: None }
    }

    fn payload_message(&mut self, item: Option<PayloadItem>) -> Option<Message<(ResponseHeader, PayloadSize)>> {
        let item = item?;
        if item.is_eof() {
            self.payload_decoder.take();
        }
        Some(Message::Payload(item))
    }
}

impl Decoder for ResponseDecoder {
    type Item = Message<(ResponseHeader, PayloadSize)>;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(payload_decoder) = &mut self.payload_decoder {
            let item = payload_decoder.decode(src)?;
            return Ok(self.payload_message(item));
        }

        let message = match self.header_decoder.decode(src)? {
            Some((header, payload_size)) => {
                self.payload_decoder = Some(payload_size.into());
                Some(Message::Header((header, payload_size)))
            }
            None => None,
        };

        Ok(message)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(payload_decoder) = &mut self.payload_decoder {
            let item = payload_decoder.decode_eof(src)?;
            return Ok(self.payload_message(item));
        }

        match self.decode(src)? {
            Some(message) => Ok(Some(message)),
            None if src.is_empty() => Ok(None),
            None => Err(ParseError::invalid_header("connection closed inside the response head")),
        }
    }
}

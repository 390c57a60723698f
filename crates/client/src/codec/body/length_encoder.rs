use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::Encoder;
use tracing::warn;

use crate::protocol::{PayloadItem, SendError};

/// Encoder for a body announced with `Content-Length`.
///
/// The encoder refuses to write more bytes than announced, and a body ending
/// short of the announced length is an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthEncoder {
    remaining: u64,
    eof: bool,
}

impl LengthEncoder {
    pub fn new(length: u64) -> Self {
        Self { remaining: length, eof: false }
    }

    pub fn is_finish(&self) -> bool {
        self.eof
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for LengthEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if self.eof {
            warn!("encode payload item after the end of body");
            return Ok(());
        }

        match item {
            PayloadItem::Chunk(mut bytes) => {
                let len = bytes.remaining() as u64;
                if len > self.remaining {
                    return Err(SendError::invalid_body(format!(
                        "body exceeds content-length, {len} bytes with {} remaining",
                        self.remaining
                    )));
                }
                dst.put(&mut bytes);
                self.remaining -= len;
                Ok(())
            }
            PayloadItem::Eof => {
                self.eof = true;
                if self.remaining == 0 {
                    Ok(())
                } else {
                    Err(SendError::invalid_body(format!("body ends {} bytes short of content-length", self.remaining)))
                }
            }
        }
    }
}

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::Encoder;
use tracing::warn;

use crate::protocol::{PayloadItem, SendError};

/// Encoder for `Transfer-Encoding: chunked` bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedEncoder {
    eof: bool,
    send_size: u64,
}

impl ChunkedEncoder {
    pub fn new() -> Self {
        Self { eof: false, send_size: 0 }
    }

    pub fn is_finish(&self) -> bool {
        self.eof
    }

    /// Body bytes encoded so far, framing excluded
    pub fn send_size(&self) -> u64 {
        self.send_size
    }
}

impl Default for ChunkedEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for ChunkedEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if self.eof {
            warn!("encode payload item after the last chunk");
            return Ok(());
        }

        match item {
            PayloadItem::Chunk(mut bytes) => {
                let len = bytes.remaining();
                // a zero sized chunk would end the body
                if len == 0 {
                    return Ok(());
                }
                let size_line = format!("{len:X}\r\n");
                dst.reserve(size_line.len() + len + 2);
                dst.put_slice(size_line.as_bytes());
                dst.put(&mut bytes);
                dst.put_slice(b"\r\n");
                self.send_size += len as u64;
                Ok(())
            }
            PayloadItem::Eof => {
                self.eof = true;
                dst.put_slice(b"0\r\n\r\n");
                Ok(())
            }
        }
    }
}

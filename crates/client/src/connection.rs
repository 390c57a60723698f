//! One request/response exchange over a byte stream.

use bytes::{Bytes, BytesMut};
use futures::{SinkExt, StreamExt};
use http::Method;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{error, trace};

use crate::codec::{RequestEncoder, ResponseDecoder};
use crate::protocol::{ClientError, Message, ParseError, PayloadItem, PayloadSize, RequestHead, ResponseHeader, SendError};

type RequestMessage = Message<(RequestHead, PayloadSize), Bytes>;

/// A client side HTTP/1.1 connection carrying a single exchange.
///
/// The request is written with [`send_head`](Self::send_head) and, when it has
/// a body, [`send_chunk`](Self::send_chunk) calls ended by
/// [`send_eof`](Self::send_eof). The response is then read whole with
/// [`receive`](Self::receive).
#[derive(Debug)]
pub struct ClientConnection<R, W> {
    framed_read: FramedRead<R, ResponseDecoder>,
    framed_write: FramedWrite<W, RequestEncoder>,
}

impl<R, W> ClientConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a connection for a request sent with `method`
    pub fn new(reader: R, writer: W, method: Method, read_buffer_size: usize) -> Self {
        Self {
            framed_read: FramedRead::with_capacity(reader, ResponseDecoder::new(method), read_buffer_size),
            framed_write: FramedWrite::new(writer, RequestEncoder::new()),
        }
    }

    pub async fn send_head(&mut self, head: RequestHead, payload_size: PayloadSize) -> Result<(), SendError> {
        self.framed_write.send(RequestMessage::Header((head, payload_size))).await
    }

    pub async fn send_chunk(&mut self, chunk: Bytes) -> Result<(), SendError> {
        trace!(len = chunk.len(), "send body chunk");
        self.framed_write.send(RequestMessage::Payload(PayloadItem::Chunk(chunk))).await
    }

    pub async fn send_eof(&mut self) -> Result<(), SendError> {
        self.framed_write.send(RequestMessage::Payload(PayloadItem::Eof)).await
    }

    /// Sends a request whose body is already in memory, framed by `Content-Length`
    pub async fn send_body(&mut self, head: RequestHead, body: Bytes) -> Result<(), SendError> {
        if body.is_empty() {
            return self.send_head(head, PayloadSize::Empty).await;
        }

        self.framed_write.feed(RequestMessage::Header((head, PayloadSize::Length(body.len() as u64)))).await?;
        self.framed_write.feed(RequestMessage::Payload(PayloadItem::Chunk(body))).await?;
        self.send_eof().await
    }

    /// Reads the response head and its whole body.
    pub async fn receive(&mut self) -> Result<(ResponseHeader, Bytes), ClientError> {
        let header = match self.framed_read.next().await {
            Some(Ok(Message::Header((header, _)))) => header,
            Some(Ok(Message::Payload(_))) => {
                error!("receive body before response head");
                return Err(ParseError::invalid_body("need header while receive body").into());
            }
            Some(Err(e)) => return Err(e.into()),
            None => return Err(ParseError::invalid_header("connection closed before the response head").into()),
        };

        let mut body = BytesMut::new();
        loop {
            match self.framed_read.next().await {
                Some(Ok(Message::Payload(PayloadItem::Chunk(bytes)))) => body.extend_from_slice(&bytes),
                Some(Ok(Message::Payload(PayloadItem::Eof))) => break,
                Some(Ok(Message::Header(_))) => {
                    error!("receive response head while reading body");
                    return Err(ParseError::invalid_body("response head inside body").into());
                }
                Some(Err(e)) => return Err(e.into()),
                None => return Err(ParseError::invalid_body("connection closed before the body was complete").into()),
            }
        }

        trace!(status = %header.status(), body_size = body.len(), "received response");
        Ok((header, body.freeze()))
    }
}

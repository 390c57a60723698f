//! Multipart form fields and the bridge streaming them into a request body.
//!
//! The [`MultipartWriter`] is a blocking writer, it runs on the blocking pool and
//! hands the encoded body to the async side through a bounded channel. The
//! channel bound keeps at most a few chunks of a large upload in memory.

use std::io;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use bytes::{Bytes, BytesMut};
use micro_multipart::{MultipartError, MultipartWriter};
use mime::Mime;
use tokio::sync::mpsc;
use tracing::debug;

/// Size at which buffered body bytes are handed to the connection
const CHUNK_SIZE: usize = 16 * 1024;

/// A field of a multipart form.
#[derive(Debug, Clone)]
pub enum FormField {
    /// A text field
    Text { name: String, value: String },
    /// A file read from disk when the request is sent
    File { name: String, mime_type: Option<Mime>, path: PathBuf },
}

impl FormField {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Text { name: name.into(), value: value.into() }
    }

    pub fn file(name: impl Into<String>, mime_type: Option<Mime>, path: impl Into<PathBuf>) -> Self {
        Self::File { name: name.into(), mime_type, path: path.into() }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::File { name, .. } => name,
        }
    }
}

/// A blocking [`Write`] sink forwarding body bytes to an async receiver.
///
/// Bytes are collected until [`CHUNK_SIZE`] is reached or the writer flushes,
/// then sent as one chunk. A dropped receiver surfaces as
/// [`ErrorKind::BrokenPipe`].
#[derive(Debug)]
pub struct BodySink {
    buffer: BytesMut,
    sender: mpsc::Sender<Bytes>,
}

impl BodySink {
    pub fn new(sender: mpsc::Sender<Bytes>) -> Self {
        Self { buffer: BytesMut::with_capacity(CHUNK_SIZE), sender }
    }

    fn send_buffered(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let chunk = self.buffer.split().freeze();
        self.sender.blocking_send(chunk).map_err(|e| io::Error::new(ErrorKind::BrokenPipe, e))
    }
}

impl Write for BodySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        if self.buffer.len() >= CHUNK_SIZE {
            self.send_buffered()?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.send_buffered()
    }
}

/// Writes `fields` as a complete multipart body delimited by `boundary`.
pub fn write_form<W: Write>(sink: W, boundary: &str, fields: &[FormField]) -> Result<W, MultipartError> {
    let mut writer = MultipartWriter::new(sink, boundary)?;
    for field in fields {
        match field {
            FormField::Text { name, value } => writer.write_text(name, value)?,
            FormField::File { name, mime_type, path } => {
                debug!(name, path = %path.display(), "attach file");
                writer.write_file(name, mime_type.as_ref().map(|mime| mime.as_ref()), path)?;
            }
        }
    }
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn text_and_file_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "sunny").unwrap();

        let fields = [FormField::text("title", "holiday"), FormField::file("notes", Some(mime::TEXT_PLAIN), &path)];
        let body = write_form(Vec::new(), "B", &fields).unwrap();

        let canonical = fs::canonicalize(&path).unwrap();
        let expected = format!(
            "--B\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nholiday\r\n\
             --B\r\nContent-Disposition: form-data; name=\"notes\"; filename=\"{}\"\r\nContent-Type: text/plain\r\n\r\nsunny\r\n\
             --B--\r\n",
            canonical.display()
        );
        assert_eq!(String::from_utf8(body).unwrap(), expected);
    }

    #[test]
    fn missing_file_fails_the_form() {
        let dir = tempfile::tempdir().unwrap();
        let fields = [FormField::file("upload", None, dir.path().join("missing.bin"))];

        let err = write_form(Vec::new(), "B", &fields).unwrap_err();

        assert!(err.is_invalid_argument());
    }

    #[test]
    fn sink_sends_chunks() {
        let (sender, mut receiver) = mpsc::channel(8);
        let mut sink = BodySink::new(sender);

        sink.write_all(&[7; CHUNK_SIZE + 10]).unwrap();
        sink.write_all(b"tail").unwrap();
        sink.flush().unwrap();
        drop(sink);

        let mut chunks = Vec::new();
        while let Some(chunk) = receiver.blocking_recv() {
            chunks.push(chunk.len());
        }
        assert_eq!(chunks, [CHUNK_SIZE + 10, 4]);
    }

    #[test]
    fn sink_reports_closed_receiver() {
        let (sender, receiver) = mpsc::channel(1);
        drop(receiver);
        let mut sink = BodySink::new(sender);

        sink.write_all(b"orphan").unwrap();

        assert_eq!(sink.flush().unwrap_err().kind(), ErrorKind::BrokenPipe);
    }
}

//! The multipart session: one sink, one boundary, parts written in call order.

use std::fs;
use std::fs::File;
use std::io;
use std::io::{ErrorKind, Read, Write};
use std::path::Path;

use bytes::BytesMut;
use tokio_util::codec::Encoder;
use tracing::{debug, error, trace};

use crate::boundary::{check_boundary, content_type, generate_boundary};
use crate::codec::{FormEncoder, FormItem, PartHead, PartKind};
use crate::utils::ensure;
use crate::{MultipartError, WriterConfig};

/// Lifecycle state of a [`MultipartWriter`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Parts may still be written
    Open,
    /// The closing delimiter was written and the sink released
    Closed,
}

/// Streaming multipart/form-data writer.
///
/// Every `write_*` call frames one part and writes it straight to the sink, then
/// flushes, so the whole form is never held in memory. [`close`](Self::close) (or
/// [`finish`](Self::finish)) writes the closing delimiter and releases the sink.
///
/// Any operation on a closed writer fails with [`MultipartError::Closed`] and writes
/// nothing. Dropping an open writer does *not* write the closing delimiter.
///
/// After an [`MultipartError::Io`] the output is no longer well framed and the writer
/// should be dropped.
///
/// # Example
///
/// ```
/// use micro_multipart::MultipartWriter;
///
/// let mut body = Vec::new();
/// let mut writer = MultipartWriter::new(&mut body, "B1").unwrap();
/// writer.write_text("field1", "hello").unwrap();
/// writer.close().unwrap();
///
/// assert_eq!(body, b"--B1\r\nContent-Disposition: form-data; name=\"field1\"\r\n\r\nhello\r\n--B1--\r\n");
/// ```
#[derive(Debug)]
pub struct MultipartWriter<W: Write> {
    sink: Option<W>,
    encoder: FormEncoder,
    buffer: BytesMut,
    config: WriterConfig,
}

impl<W: Write> MultipartWriter<W> {
    /// Creates a writer over `sink` delimiting parts with `boundary`.
    ///
    /// # Errors
    ///
    /// Returns [`MultipartError::InvalidArgument`] if `boundary` is not a valid boundary.
    pub fn new(sink: W, boundary: impl Into<String>) -> Result<Self, MultipartError> {
        Self::with_config(sink, boundary, WriterConfig::default())
    }

    /// Creates a writer with explicit settings.
    ///
    /// # Errors
    ///
    /// Returns [`MultipartError::InvalidArgument`] if `boundary` is empty or holds
    /// characters outside the RFC 2046 boundary alphabet, which is plain ASCII.
    pub fn with_config(sink: W, boundary: impl Into<String>, config: WriterConfig) -> Result<Self, MultipartError> {
        let boundary = boundary.into();
        check_boundary(&boundary)?;
        Ok(Self::from_parts(sink, boundary, config))
    }

    /// Creates a writer with a freshly generated boundary.
    pub fn with_random_boundary(sink: W) -> Self {
        Self::from_parts(sink, generate_boundary(), WriterConfig::default())
    }

    fn from_parts(sink: W, boundary: String, config: WriterConfig) -> Self {
        Self { sink: Some(sink), encoder: FormEncoder::new(boundary, config.charset()), buffer: BytesMut::new(), config }
    }

    pub fn boundary(&self) -> &str {
        self.encoder.boundary()
    }

    /// The `Content-Type` value the enclosing request must carry
    pub fn content_type(&self) -> String {
        content_type(self.encoder.boundary())
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        if self.sink.is_some() { SessionState::Open } else { SessionState::Closed }
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.state() == SessionState::Closed
    }

    /// Returns the sink, or `None` once the session is closed
    pub fn get_ref(&self) -> Option<&W> {
        self.sink.as_ref()
    }

    /// Writes a text field.
    ///
    /// # Errors
    ///
    /// - [`MultipartError::Closed`] if the session is closed
    /// - [`MultipartError::InvalidArgument`] if `name` is empty or `value` can't be encoded
    /// - [`MultipartError::Io`] if the sink fails
    pub fn write_text(&mut self, name: &str, value: &str) -> Result<(), MultipartError> {
        let Some(sink) = self.sink.as_mut() else {
            error!(name, "write text field on a closed multipart session");
            return Err(MultipartError::Closed);
        };

        let head = PartHead::value(name);
        head.validate(self.config.strict_headers())?;
        let value = self.config.charset().encode(value)?;

        self.encoder.encode(FormItem::Head(head), &mut self.buffer)?;
        self.encoder.encode(FormItem::Data(&value), &mut self.buffer)?;
        self.encoder.encode(FormItem::Tail, &mut self.buffer)?;
        drain(&mut self.buffer, sink)?;
        sink.flush()?;

        trace!(name, len = value.len(), "wrote text part");
        Ok(())
    }

    /// Writes a text field, an absent value is written as the empty string.
    ///
    /// # Errors
    ///
    /// Same as [`write_text`](Self::write_text).
    pub fn write_value(&mut self, name: &str, value: Option<&str>) -> Result<(), MultipartError> {
        self.write_text(name, value.unwrap_or_default())
    }

    /// Writes in-memory bytes as a file part, verbatim.
    ///
    /// # Errors
    ///
    /// - [`MultipartError::Closed`] if the session is closed
    /// - [`MultipartError::InvalidArgument`] if `name` or `file_name` is empty
    /// - [`MultipartError::Io`] if the sink fails
    pub fn write_bytes(
        &mut self,
        name: &str,
        mime_type: Option<&str>,
        file_name: &str,
        data: &[u8],
    ) -> Result<(), MultipartError> {
        let Some(sink) = self.sink.as_mut() else {
            error!(name, "write file bytes on a closed multipart session");
            return Err(MultipartError::Closed);
        };

        let head = PartHead::file(PartKind::FileBytes, name, mime_type, file_name);
        head.validate(self.config.strict_headers())?;

        self.encoder.encode(FormItem::Head(head), &mut self.buffer)?;
        drain(&mut self.buffer, sink)?;
        sink.write_all(data)?;
        self.encoder.encode(FormItem::Tail, &mut self.buffer)?;
        drain(&mut self.buffer, sink)?;
        sink.flush()?;

        trace!(name, file_name, len = data.len(), "wrote file bytes part");
        Ok(())
    }

    /// Copies everything `source` yields into a file part.
    ///
    /// The copy goes through a buffer of
    /// [`stream_buffer_size`](WriterConfig::stream_buffer_size) bytes, memory use does
    /// not grow with the source length. `source` is dropped once exhausted.
    ///
    /// # Errors
    ///
    /// - [`MultipartError::Closed`] if the session is closed
    /// - [`MultipartError::InvalidArgument`] if `name` or `file_name` is empty
    /// - [`MultipartError::Io`] if the sink or the source fails
    pub fn write_stream<R: Read>(
        &mut self,
        name: &str,
        mime_type: Option<&str>,
        file_name: &str,
        mut source: R,
    ) -> Result<(), MultipartError> {
        let Some(sink) = self.sink.as_mut() else {
            error!(name, "write file stream on a closed multipart session");
            return Err(MultipartError::Closed);
        };

        let head = PartHead::file(PartKind::FileStream, name, mime_type, file_name);
        head.validate(self.config.strict_headers())?;

        self.encoder.encode(FormItem::Head(head), &mut self.buffer)?;
        drain(&mut self.buffer, sink)?;

        let mut chunk = vec![0u8; self.config.stream_buffer_size()];
        let mut total = 0u64;
        loop {
            let n = match source.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            sink.write_all(&chunk[..n])?;
            total += n as u64;
        }
        // releasing a source can't fail, whatever it holds is freed here
        drop(source);

        self.encoder.encode(FormItem::Tail, &mut self.buffer)?;
        drain(&mut self.buffer, sink)?;
        sink.flush()?;

        trace!(name, file_name, len = total, "wrote file stream part");
        Ok(())
    }

    /// Streams a file from disk, using its canonical path as the file name.
    ///
    /// # Errors
    ///
    /// - [`MultipartError::Closed`] if the session is closed
    /// - [`MultipartError::InvalidArgument`] if `path` doesn't exist, is a directory,
    ///   or `name` is empty; nothing is written in that case
    /// - [`MultipartError::Io`] if the file can't be opened or read, or the sink fails
    pub fn write_file(
        &mut self,
        name: &str,
        mime_type: Option<&str>,
        path: impl AsRef<Path>,
    ) -> Result<(), MultipartError> {
        ensure!(!self.is_closed(), MultipartError::Closed);

        let path = path.as_ref();
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(MultipartError::invalid_argument(format!("file {} must exist", path.display())));
            }
            Err(e) => return Err(e.into()),
        };
        ensure!(
            !metadata.is_dir(),
            MultipartError::invalid_argument(format!("file {} cannot be a directory", path.display()))
        );

        let canonical = fs::canonicalize(path)?;
        let file_name = canonical.to_string_lossy();
        let file = File::open(&canonical)?;
        debug!(name, path = %canonical.display(), len = metadata.len(), "streaming file part");

        self.write_stream(name, mime_type, &file_name, file)
    }

    /// Writes the closing delimiter, flushes and releases the sink.
    ///
    /// # Errors
    ///
    /// - [`MultipartError::Closed`] if the session is already closed
    /// - [`MultipartError::Io`] if the sink fails; the session is closed regardless
    pub fn close(&mut self) -> Result<(), MultipartError> {
        let Some(mut sink) = self.sink.take() else {
            error!("close an already closed multipart session");
            return Err(MultipartError::Closed);
        };

        self.write_closing(&mut sink)
    }

    /// Writes the closing delimiter, flushes and hands the sink back.
    ///
    /// # Errors
    ///
    /// - [`MultipartError::Closed`] if the session is already closed
    /// - [`MultipartError::Io`] if the sink fails
    pub fn finish(mut self) -> Result<W, MultipartError> {
        let Some(mut sink) = self.sink.take() else {
            error!("finish an already closed multipart session");
            return Err(MultipartError::Closed);
        };

        self.write_closing(&mut sink)?;
        Ok(sink)
    }

    fn write_closing(&mut self, sink: &mut W) -> Result<(), MultipartError> {
        self.encoder.encode(FormItem::Close, &mut self.buffer)?;
        drain(&mut self.buffer, sink)?;
        sink.flush()?;

        debug!(boundary = self.encoder.boundary(), "multipart session closed");
        Ok(())
    }
}

/// Moves the encoded framing bytes to the sink.
fn drain<W: Write>(buffer: &mut BytesMut, sink: &mut W) -> io::Result<()> {
    let result = sink.write_all(buffer);
    buffer.clear();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Charset;
    use std::io::Cursor;

    /// A sink that counts flushes and can be told to fail.
    #[derive(Debug, Default)]
    struct MockSink {
        data: Vec<u8>,
        flushes: usize,
        fail_writes: bool,
    }

    impl Write for MockSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail_writes {
                return Err(io::Error::new(ErrorKind::BrokenPipe, "sink gone"));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    /// A source returning at most `step` bytes per read, interrupted every other call.
    struct TrickleSource {
        data: Cursor<Vec<u8>>,
        step: usize,
        interrupt: bool,
    }

    impl Read for TrickleSource {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::Error::from(ErrorKind::Interrupted));
            }
            let len = buf.len().min(self.step);
            self.data.read(&mut buf[..len])
        }
    }

    struct FailingSource;

    impl Read for FailingSource {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::ConnectionReset, "source gone"))
        }
    }

    #[test]
    fn empty_boundary_is_rejected() {
        let err = MultipartWriter::new(Vec::new(), "").unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn non_ascii_boundary_is_rejected() {
        let config = WriterConfig::new().with_charset(Charset::Latin1);
        let mut body = Vec::new();

        let err = MultipartWriter::with_config(&mut body, "B\u{e9}", config).unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(MultipartWriter::new(&mut body, "B\r\nX-Injected: 1").unwrap_err().is_invalid_argument());
        assert!(body.is_empty());
    }

    #[test]
    fn text_part_scenario() {
        let mut body = Vec::new();
        let mut writer = MultipartWriter::new(&mut body, "B1").unwrap();

        writer.write_text("field1", "hello").unwrap();
        writer.close().unwrap();

        assert_eq!(body, b"--B1\r\nContent-Disposition: form-data; name=\"field1\"\r\n\r\nhello\r\n--B1--\r\n");
    }

    #[test]
    fn bytes_part_scenario() {
        let mut body = Vec::new();
        let mut writer = MultipartWriter::new(&mut body, "B2").unwrap();

        writer.write_bytes("f", Some("text/plain"), "a.txt", b"AB").unwrap();
        writer.close().unwrap();

        assert_eq!(
            body,
            &b"--B2\r\nContent-Disposition: form-data; name=\"f\"; filename=\"a.txt\"\r\nContent-Type: text/plain\r\n\r\nAB\r\n--B2--\r\n"[..]
        );
    }

    #[test]
    fn absent_value_is_empty_string() {
        let mut body = Vec::new();
        let mut writer = MultipartWriter::new(&mut body, "B").unwrap();

        writer.write_value("empty", None).unwrap();
        writer.write_value("full", Some("x")).unwrap();
        writer.close().unwrap();

        assert_eq!(
            body,
            &b"--B\r\nContent-Disposition: form-data; name=\"empty\"\r\n\r\n\r\n--B\r\nContent-Disposition: form-data; name=\"full\"\r\n\r\nx\r\n--B--\r\n"[..]
        );
    }

    #[test]
    fn each_part_is_flushed() {
        let mut writer = MultipartWriter::new(MockSink::default(), "B").unwrap();

        writer.write_text("a", "1").unwrap();
        assert_eq!(writer.get_ref().unwrap().flushes, 1);

        writer.write_bytes("b", None, "b.bin", &[0, 1]).unwrap();
        assert_eq!(writer.get_ref().unwrap().flushes, 2);

        writer.write_stream("c", None, "c.bin", &b"stream"[..]).unwrap();
        assert_eq!(writer.get_ref().unwrap().flushes, 3);

        let sink = writer.finish().unwrap();
        assert_eq!(sink.flushes, 4);
        assert!(sink.data.ends_with(b"--B--\r\n"));
    }

    #[test]
    fn validation_happens_before_io() {
        let mut body = Vec::new();
        let mut writer = MultipartWriter::new(&mut body, "B").unwrap();

        assert!(writer.write_text("", "v").unwrap_err().is_invalid_argument());
        assert!(writer.write_bytes("f", None, "", b"data").unwrap_err().is_invalid_argument());
        assert!(writer.write_stream("f", None, "", &b"data"[..]).unwrap_err().is_invalid_argument());
        assert!(writer.write_file("f", None, "/definitely/not/here.txt").unwrap_err().is_invalid_argument());
        assert!(writer.get_ref().unwrap().is_empty());

        // the session is still usable
        writer.write_text("ok", "v").unwrap();
        writer.close().unwrap();
        assert!(body.starts_with(b"--B\r\n"));
    }

    #[test]
    fn closed_session_rejects_everything() {
        let mut body = Vec::new();
        let mut writer = MultipartWriter::new(&mut body, "B").unwrap();
        writer.close().unwrap();

        assert_eq!(writer.state(), SessionState::Closed);
        assert!(writer.write_text("a", "b").unwrap_err().is_closed());
        assert!(writer.write_value("a", None).unwrap_err().is_closed());
        assert!(writer.write_bytes("a", None, "a", b"x").unwrap_err().is_closed());
        assert!(writer.write_stream("a", None, "a", &b"x"[..]).unwrap_err().is_closed());
        assert!(writer.write_file("a", None, ".").unwrap_err().is_closed());
        assert!(writer.close().unwrap_err().is_closed());
        assert!(writer.finish().unwrap_err().is_closed());

        assert_eq!(body, b"--B--\r\n");
    }

    #[test]
    fn stream_survives_short_and_interrupted_reads() {
        let data: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        let source = TrickleSource { data: Cursor::new(data.clone()), step: 7, interrupt: false };

        let mut streamed = Vec::new();
        let mut writer = MultipartWriter::new(&mut streamed, "B").unwrap();
        writer.write_stream("f", None, "f.bin", source).unwrap();
        writer.close().unwrap();

        let mut expected = Vec::new();
        let mut writer = MultipartWriter::new(&mut expected, "B").unwrap();
        writer.write_bytes("f", None, "f.bin", &data).unwrap();
        writer.close().unwrap();

        assert_eq!(streamed, expected);
    }

    #[test]
    fn small_stream_buffer_is_transparent() {
        let config = WriterConfig::new().with_stream_buffer_size(3);
        let mut body = Vec::new();
        let mut writer = MultipartWriter::with_config(&mut body, "B", config).unwrap();

        writer.write_stream("f", Some("application/octet-stream"), "f.bin", &b"0123456789"[..]).unwrap();
        writer.close().unwrap();

        assert_eq!(
            body,
            &b"--B\r\nContent-Disposition: form-data; name=\"f\"; filename=\"f.bin\"\r\nContent-Type: application/octet-stream\r\n\r\n0123456789\r\n--B--\r\n"[..]
        );
    }

    #[test]
    fn source_failure_is_propagated() {
        let mut writer = MultipartWriter::new(Vec::new(), "B").unwrap();

        let err = writer.write_stream("f", None, "f.bin", FailingSource).unwrap_err();

        match err {
            MultipartError::Io { source } => assert_eq!(source.kind(), ErrorKind::ConnectionReset),
            e => panic!("unexpected error {e}"),
        }
    }

    #[test]
    fn sink_failure_is_propagated() {
        let sink = MockSink { fail_writes: true, ..MockSink::default() };
        let mut writer = MultipartWriter::new(sink, "B").unwrap();

        assert!(writer.write_text("a", "b").unwrap_err().is_io());
        // close still releases the sink
        assert!(writer.close().unwrap_err().is_io());
        assert!(writer.is_closed());
    }

    #[test]
    fn latin1_text_value() {
        let config = WriterConfig::new().with_charset(Charset::Latin1);
        let mut body = Vec::new();
        let mut writer = MultipartWriter::with_config(&mut body, "B", config).unwrap();

        writer.write_text("name", "Andr\u{e9}").unwrap();
        assert!(writer.write_text("name", "\u{2603}").unwrap_err().is_invalid_argument());
        writer.close().unwrap();

        assert_eq!(body, &b"--B\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\nAndr\xe9\r\n--B--\r\n"[..]);
    }

    #[test]
    fn names_are_literal_unless_strict() {
        let mut body = Vec::new();
        let mut writer = MultipartWriter::new(&mut body, "B").unwrap();
        writer.write_text("a\"b", "v").unwrap();
        writer.close().unwrap();
        assert!(body.windows(14).any(|w| w == b"name=\"a\"b\"\r\n\r\n"));

        let config = WriterConfig::new().with_strict_headers(true);
        let mut writer = MultipartWriter::with_config(Vec::new(), "B", config).unwrap();
        assert!(writer.write_text("a\"b", "v").unwrap_err().is_invalid_argument());
    }

    #[test]
    fn random_boundary_writer() {
        let writer = MultipartWriter::with_random_boundary(Vec::new());

        assert!(writer.boundary().starts_with(crate::boundary::BOUNDARY_PREFIX));
        assert_eq!(writer.content_type(), format!("multipart/form-data; boundary={}", writer.boundary()));
        assert_eq!(writer.state(), SessionState::Open);
    }
}

use crate::Charset;

/// Default size of the intermediate buffer used when copying a byte source.
pub const DEFAULT_STREAM_BUFFER_SIZE: usize = 8 * 1024;

/// Settings of a [`MultipartWriter`](crate::MultipartWriter) session.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct WriterConfig {
    charset: Charset,
    stream_buffer_size: usize,
    strict_headers: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self { charset: Charset::default(), stream_buffer_size: DEFAULT_STREAM_BUFFER_SIZE, strict_headers: false }
    }
}

impl WriterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the charset used for text values and header lines
    #[must_use]
    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    /// Sets the chunk size used by `write_stream`, a zero size falls back to the default
    #[must_use]
    pub fn with_stream_buffer_size(mut self, size: usize) -> Self {
        self.stream_buffer_size = if size == 0 { DEFAULT_STREAM_BUFFER_SIZE } else { size };
        self
    }

    /// Rejects `"`, CR and LF inside field names, file names and mime types.
    ///
    /// Off by default: names are written literally, so a caller passing such
    /// characters can break the header grammar. Turning this on changes which
    /// inputs are accepted, never the bytes written for accepted inputs.
    #[must_use]
    pub fn with_strict_headers(mut self, strict: bool) -> Self {
        self.strict_headers = strict;
        self
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }

    pub fn stream_buffer_size(&self) -> usize {
        self.stream_buffer_size
    }

    pub fn strict_headers(&self) -> bool {
        self.strict_headers
    }
}

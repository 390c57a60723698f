//! Fixtures shared by the benchmarks.

/// A recorded wire message used as decoder input.
#[derive(Debug, Copy, Clone)]
pub struct WireFile {
    name: &'static str,
    content: &'static str,
}

impl WireFile {
    pub const fn new(name: &'static str, content: &'static str) -> Self {
        Self { name, content }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn content(&self) -> &'static str {
        self.content
    }
}

/// The shape of a multipart form to encode.
#[derive(Debug, Copy, Clone)]
pub struct UploadCase {
    name: &'static str,
    text_fields: usize,
    file_size: usize,
}

impl UploadCase {
    pub const fn new(name: &'static str, text_fields: usize, file_size: usize) -> Self {
        Self { name, text_fields, file_size }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn text_fields(&self) -> usize {
        self.text_fields
    }

    /// Deterministic binary content of the attached file
    pub fn file_content(&self) -> Vec<u8> {
        (0..self.file_size).map(|i| (i * 31 % 251) as u8).collect()
    }

    /// Payload bytes of the form, framing excluded
    pub fn payload_size(&self) -> u64 {
        (self.file_size + self.text_fields * 16) as u64
    }
}

pub const UPLOAD_CASES: [UploadCase; 4] = [
    UploadCase::new("fields_only", 32, 0),
    UploadCase::new("small_file", 4, 4 * 1024),
    UploadCase::new("medium_file", 4, 256 * 1024),
    UploadCase::new("large_file", 4, 4 * 1024 * 1024),
];

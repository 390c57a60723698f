//! Description of a single part, as written before its payload.

use std::fmt;

use crate::utils::ensure;
use crate::MultipartError;

/// The flavor of a part.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PartKind {
    /// Plain text value, no `filename`
    Value,
    /// In-memory bytes presented as a file
    FileBytes,
    /// Lazily read byte source presented as a file
    FileStream,
}

impl PartKind {
    #[inline]
    pub fn is_file(&self) -> bool {
        !matches!(self, PartKind::Value)
    }
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let str = match self {
            PartKind::Value => "value",
            PartKind::FileBytes => "file-bytes",
            PartKind::FileStream => "file-stream",
        };
        f.write_str(str)
    }
}

/// The header block of one part: field name, optional file name and content type.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PartHead<'a> {
    kind: PartKind,
    name: &'a str,
    file_name: Option<&'a str>,
    mime_type: Option<&'a str>,
}

impl<'a> PartHead<'a> {
    /// Head of a text part
    pub fn value(name: &'a str) -> Self {
        Self { kind: PartKind::Value, name, file_name: None, mime_type: None }
    }

    /// Head of a file part, `kind` must be one of the file kinds
    pub fn file(kind: PartKind, name: &'a str, mime_type: Option<&'a str>, file_name: &'a str) -> Self {
        debug_assert!(kind.is_file(), "file part head built with kind {kind}");
        Self { kind, name, file_name: Some(file_name), mime_type }
    }

    pub fn kind(&self) -> PartKind {
        self.kind
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn file_name(&self) -> Option<&'a str> {
        self.file_name
    }

    pub fn mime_type(&self) -> Option<&'a str> {
        self.mime_type
    }

    /// Checks the required fields, and with `strict` also the characters that
    /// would break the `Content-Disposition` / `Content-Type` lines.
    pub(crate) fn validate(&self, strict: bool) -> Result<(), MultipartError> {
        ensure!(!self.name.is_empty(), MultipartError::invalid_argument("field name must not be empty"));

        if self.kind.is_file() {
            let file_name = self.file_name.unwrap_or_default();
            ensure!(!file_name.is_empty(), MultipartError::invalid_argument("file name must be provided"));
        }

        if strict {
            check_header_value("field name", self.name)?;
            if let Some(file_name) = self.file_name {
                check_header_value("file name", file_name)?;
            }
            if let Some(mime_type) = self.mime_type {
                check_header_value("mime type", mime_type)?;
            }
        }

        Ok(())
    }
}

fn check_header_value(what: &str, value: &str) -> Result<(), MultipartError> {
    match value.chars().find(|c| matches!(c, '"' | '\r' | '\n')) {
        Some(c) => Err(MultipartError::invalid_argument(format!("{what} {value:?} contains forbidden char {c:?}"))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_head_has_no_file_name() {
        let head = PartHead::value("field1");

        assert_eq!(head.kind(), PartKind::Value);
        assert_eq!(head.name(), "field1");
        assert_eq!(head.file_name(), None);
        assert_eq!(head.mime_type(), None);
        assert!(head.validate(true).is_ok());
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = PartHead::value("").validate(false).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn file_head_requires_file_name() {
        let err = PartHead::file(PartKind::FileBytes, "f", None, "").validate(false).unwrap_err();
        assert!(err.is_invalid_argument());

        assert!(PartHead::file(PartKind::FileStream, "f", Some("text/plain"), "a.txt").validate(false).is_ok());
    }

    #[test]
    fn quotes_pass_unless_strict() {
        let head = PartHead::file(PartKind::FileBytes, "f", None, "a\"b.txt");

        assert!(head.validate(false).is_ok());
        assert!(head.validate(true).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn strict_rejects_line_breaks() {
        assert!(PartHead::value("a\r\nX-Injected: 1").validate(true).is_err());
        assert!(PartHead::file(PartKind::FileBytes, "f", Some("text/plain\n"), "a.txt").validate(true).is_err());
    }
}

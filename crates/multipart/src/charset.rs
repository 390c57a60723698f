use std::borrow::Cow;
use std::fmt;

use crate::MultipartError;

/// Text encoding applied to text values and to the part header lines.
///
/// The encoding is always explicit so the produced bytes never depend on the
/// platform default. [`Charset::Utf8`] is the default.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Charset {
    /// UTF-8, text is written as is
    #[default]
    Utf8,
    /// ISO-8859-1, every char must be in `U+0000..=U+00FF`
    Latin1,
}

impl Charset {
    /// Encodes `text` into bytes.
    ///
    /// # Errors
    ///
    /// Returns [`MultipartError::InvalidArgument`] when `text` holds a char the
    /// charset can't represent.
    pub fn encode<'a>(&self, text: &'a str) -> Result<Cow<'a, [u8]>, MultipartError> {
        match self {
            Charset::Utf8 => Ok(Cow::Borrowed(text.as_bytes())),
            Charset::Latin1 if text.is_ascii() => Ok(Cow::Borrowed(text.as_bytes())),
            Charset::Latin1 => text
                .chars()
                .map(|c| {
                    u8::try_from(u32::from(c))
                        .map_err(|_| MultipartError::invalid_argument(format!("char {c:?} can't be encoded as {self}")))
                })
                .collect::<Result<Vec<u8>, _>>()
                .map(Cow::Owned),
        }
    }

    /// The IANA name of the charset
    pub fn as_str(&self) -> &'static str {
        match self {
            Charset::Utf8 => "UTF-8",
            Charset::Latin1 => "ISO-8859-1",
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Boundary generation and the `Content-Type` value of a multipart body.
//!
//! These are pure helpers: the enclosing request layer can call them without
//! holding a [`MultipartWriter`](crate::MultipartWriter), e.g. to set the
//! request `Content-Type` header before the body is produced.

use mime::Mime;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::MultipartError;
use crate::utils::ensure;

/// Fixed prefix of every generated boundary: twenty dashes.
pub const BOUNDARY_PREFIX: &str = "--------------------";

/// Creates a random boundary token.
///
/// The token is [`BOUNDARY_PREFIX`] followed by a random 64-bit value in lowercase hex.
/// A fresh OS-seeded generator is used for every call, so no random state is shared
/// between sessions.
pub fn generate_boundary() -> String {
    generate_boundary_with(&mut StdRng::from_os_rng())
}

/// Creates a boundary token drawing the random part from `rng`.
pub fn generate_boundary_with<R: RngCore + ?Sized>(rng: &mut R) -> String {
    format!("{BOUNDARY_PREFIX}{:x}", rng.next_u64())
}

/// Checks `boundary` against the `bchars` of RFC 2046: ASCII letters, digits,
/// `'()+_,-./:=?` and space, not ending with a space.
pub(crate) fn check_boundary(boundary: &str) -> Result<(), MultipartError> {
    ensure!(!boundary.is_empty(), MultipartError::invalid_argument("boundary must not be empty"));
    ensure!(!boundary.ends_with(' '), MultipartError::invalid_argument("boundary must not end with a space"));

    if let Some(c) = boundary.chars().find(|&c| !is_bchar(c)) {
        return Err(MultipartError::invalid_argument(format!("boundary contains {c:?}, not allowed in a boundary")));
    }
    Ok(())
}

fn is_bchar(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '\'' | '(' | ')' | '+' | '_' | ',' | '-' | '.' | '/' | ':' | '=' | '?' | ' ')
}

/// Returns the `Content-Type` value announcing a multipart body delimited by `boundary`.
pub fn content_type(boundary: &str) -> String {
    format!("multipart/form-data; boundary={boundary}")
}

/// Same as [`content_type`], parsed into a [`Mime`].
///
/// # Errors
///
/// Returns [`MultipartError::InvalidArgument`] when the boundary cannot be carried
/// as a MIME parameter value.
pub fn content_type_mime(boundary: &str) -> Result<Mime, MultipartError> {
    content_type(boundary)
        .parse::<Mime>()
        .map_err(|e| MultipartError::invalid_argument(format!("boundary {boundary:?} is not a valid mime parameter: {e}")))
}

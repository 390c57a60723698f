//! Internal helper macros.

/// Returns early with `$error` when `$predicate` does not hold.
///
/// Works like `assert!`, but returns an error instead of panicking.
///
/// ```ignore
/// ensure!(!name.is_empty(), MultipartError::invalid_argument("field name must not be empty"));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;

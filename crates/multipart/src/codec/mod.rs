//! multipart/form-data framing codec
//!
//! - [`PartHead`]: field name, file name and content type of one part
//! - [`FormEncoder`]: serializes [`FormItem`]s (part heads, part tails, the closing
//!   delimiter) into a `BytesMut`, rejecting items that arrive out of order
//!
//! The codec never touches I/O; [`MultipartWriter`](crate::MultipartWriter) drives it
//! and moves the encoded bytes to the sink.

mod form_encoder;
mod part_head;

pub use form_encoder::FormEncoder;
pub use form_encoder::FormItem;
pub use part_head::PartHead;
pub use part_head::PartKind;

//! Protocol types shared by the codecs and the client.
//!
//! - [`Message`], [`PayloadItem`], [`PayloadSize`]: a message as a head followed by
//!   body items, and how the body is framed
//! - [`RequestHead`] / [`ResponseHeader`]: the two heads of an exchange
//! - [`ClientError`], [`ParseError`], [`SendError`]: error types

mod message;
pub use message::Message;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod request;
pub use request::RequestHead;

mod response;
pub use response::ResponseHeader;

mod error;
pub use error::ClientError;
pub use error::ParseError;
pub use error::SendError;

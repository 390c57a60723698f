//! Request heads as they leave the client.

use http::Request;

/// The head of an outgoing request, the body travels separately as
/// [`PayloadItem`](crate::protocol::PayloadItem)s.
pub type RequestHead = Request<()>;

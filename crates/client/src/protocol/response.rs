//! Response heads as the client receives them.

use http::{HeaderMap, Method, Response, StatusCode, Version};

/// The head of a received response.
#[derive(Debug)]
pub struct ResponseHeader {
    inner: Response<()>,
}

impl ResponseHeader {
    #[inline]
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    #[inline]
    pub fn version(&self) -> Version {
        self.inner.version()
    }

    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Returns true when a body follows this head for a request sent with `method`.
    ///
    /// Responses to HEAD, informational responses, `204 No Content` and
    /// `304 Not Modified` never carry a body.
    pub fn has_body(&self, method: &Method) -> bool {
        let status = self.status();
        !(method == Method::HEAD
            || status.is_informational()
            || status == StatusCode::NO_CONTENT
            || status == StatusCode::NOT_MODIFIED)
    }

    pub fn into_inner(self) -> Response<()> {
        self.inner
    }
}

impl From<Response<()>> for ResponseHeader {
    fn from(inner: Response<()>) -> Self {
        Self { inner }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(status: StatusCode) -> ResponseHeader {
        Response::builder().status(status).body(()).unwrap().into()
    }

    #[test]
    fn bodyless_responses() {
        assert!(header(StatusCode::OK).has_body(&Method::GET));
        assert!(!header(StatusCode::OK).has_body(&Method::HEAD));
        assert!(!header(StatusCode::NO_CONTENT).has_body(&Method::POST));
        assert!(!header(StatusCode::NOT_MODIFIED).has_body(&Method::GET));
        assert!(!header(StatusCode::CONTINUE).has_body(&Method::GET));
    }
}

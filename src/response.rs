//! Response sink shared by every middleware of one request.
//!
//! Middleware do not return responses; they write into the sink. The sink
//! buffers what they write and remembers whether headers went out, which is
//! the one fact the executor needs to decide whether the chain may advance.

use bytes::{Bytes, BytesMut};
use http::header::{HeaderName, HeaderValue};
use http::StatusCode;
use http_body_util::Full;
use tracing::{debug, warn};

/// The response sink for one request.
///
/// ```rust
/// use relay::{Response, StatusCode};
///
/// let mut res = Response::new();
/// res.write_head(StatusCode::CREATED, &[("location", "/users/42")]);
/// res.write("{\"id\":");
/// res.end("42}");
///
/// assert!(res.headers_sent());
/// assert_eq!(res.body(), b"{\"id\":42}");
/// ```
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: BytesMut,
    headers_sent: bool,
    finished: bool,
}

impl Response {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: Vec::new(),
            body: BytesMut::new(),
            headers_sent: false,
            finished: false,
        }
    }

    /// Sends the status line and headers.
    ///
    /// Only the first call counts. Later calls are ignored so that a sink can
    /// never be "sent" twice.
    pub fn write_head(&mut self, status: StatusCode, headers: &[(&str, &str)]) {
        if self.headers_sent {
            debug!(status = status.as_u16(), "headers already sent, write_head ignored");
            return;
        }
        self.status = status;
        self.headers.extend(headers.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())));
        self.headers_sent = true;
    }

    /// Adds a header to be sent with the next `write_head`, `write` or `end`.
    pub fn set_header(&mut self, name: &str, value: &str) {
        if self.headers_sent {
            debug!(header = name, "headers already sent, set_header ignored");
            return;
        }
        self.headers.push((name.to_owned(), value.to_owned()));
    }

    /// Appends a body chunk, sending headers with the current status first.
    pub fn write(&mut self, chunk: impl AsRef<[u8]>) {
        if self.finished {
            warn!("response already ended, chunk dropped");
            return;
        }
        self.headers_sent = true;
        self.body.extend_from_slice(chunk.as_ref());
    }

    /// Writes a final chunk and closes the response. Pass `""` for none.
    pub fn end(&mut self, chunk: impl AsRef<[u8]>) {
        self.write(chunk);
        self.finished = true;
    }

    /// `write_head` with `Content-Type: text/plain`, then `end(body)`.
    pub fn text(&mut self, status: StatusCode, body: impl AsRef<[u8]>) {
        self.write_head(status, &[("Content-Type", "text/plain")]);
        self.end(body);
    }

    pub fn headers_sent(&self) -> bool { self.headers_sent }
    pub fn is_finished(&self) -> bool { self.finished }
    pub fn status(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Converts the buffered sink into the hyper response.
    pub(crate) fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut inner = http::Response::new(Full::new(self.body.freeze()));
        *inner.status_mut() = self.status;
        for (name, value) in &self.headers {
            match (HeaderName::try_from(name.as_str()), HeaderValue::try_from(value.as_str())) {
                (Ok(name), Ok(value)) => {
                    inner.headers_mut().append(name, value);
                }
                _ => warn!(header = %name, "invalid response header dropped"),
            }
        }
        inner
    }
}

impl Default for Response {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_head_is_idempotent() {
        let mut res = Response::new();
        res.write_head(StatusCode::ACCEPTED, &[("x-first", "1")]);
        res.write_head(StatusCode::NOT_FOUND, &[("x-second", "2")]);

        assert_eq!(res.status(), StatusCode::ACCEPTED);
        assert_eq!(res.header("x-first"), Some("1"));
        assert_eq!(res.header("x-second"), None);
    }

    #[test]
    fn write_implicitly_sends_headers() {
        let mut res = Response::new();
        res.set_header("content-type", "text/html");
        assert!(!res.headers_sent());

        res.write("<p>");
        assert!(res.headers_sent());
        assert_eq!(res.status(), StatusCode::OK);

        res.set_header("x-late", "1");
        assert_eq!(res.header("x-late"), None);
    }

    #[test]
    fn chunks_after_end_are_dropped() {
        let mut res = Response::new();
        res.text(StatusCode::OK, "done");
        res.write("more");
        res.end("and more");

        assert!(res.is_finished());
        assert_eq!(res.body(), b"done");
        assert_eq!(res.header("content-type"), Some("text/plain"));
    }

    #[test]
    fn into_inner_skips_invalid_headers() {
        let mut res = Response::new();
        res.write_head(StatusCode::NOT_FOUND, &[("content-type", "text/plain"), ("bad header", "x")]);
        res.end("gone");

        let inner = res.into_inner();
        assert_eq!(inner.status(), StatusCode::NOT_FOUND);
        assert_eq!(inner.headers()["content-type"], "text/plain");
        assert_eq!(inner.headers().len(), 1);
    }
}

//! Request descriptor handed to the chain.

use bytes::Bytes;

/// An incoming HTTP request.
///
/// The transport builds one per request; tests and embedders build them by
/// hand with [`Request::new`].
#[derive(Clone, Debug)]
pub struct Request {
    method: String,
    url: String,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl Request {
    /// A request with no headers and an empty body.
    ///
    /// `url` is the request target as received: path plus optional query.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub(crate) fn from_parts(parts: http::request::Parts, body: Bytes) -> Self {
        let url = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_owned())
            .unwrap_or_else(|| parts.uri.path().to_owned());
        let headers = parts
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|v| (name.as_str().to_owned(), v.to_owned()))
            })
            .collect();

        Self { method: parts.method.as_str().to_owned(), url, headers, body }
    }

    pub fn method(&self) -> &str { &self.method }
    pub fn url(&self) -> &str { &self.url }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// First path segment of the URL, as `/<segment>`.
    ///
    /// `/users/42` gives `/users`, `/` gives `/`. Everything after the second
    /// `/` is ignored and nothing is decoded, so `/users?page=2` gives
    /// `/users?page=2`.
    pub fn segment(&self) -> String {
        let first = self.url.split('/').nth(1).unwrap_or("");
        format!("/{first}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_is_text_up_to_second_slash() {
        assert_eq!(Request::new("get", "/users/42/posts").segment(), "/users");
        assert_eq!(Request::new("get", "/users").segment(), "/users");
        assert_eq!(Request::new("get", "/users/").segment(), "/users");
        assert_eq!(Request::new("get", "/").segment(), "/");
        assert_eq!(Request::new("get", "").segment(), "/");
        assert_eq!(Request::new("get", "/users?page=2").segment(), "/users?page=2");
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = Request::new("GET", "/").with_header("Content-Type", "text/plain");
        assert_eq!(req.header("content-type"), Some("text/plain"));
        assert_eq!(req.header("accept"), None);
    }

    #[test]
    fn from_parts_keeps_query_and_headers() {
        let (parts, ()) = http::Request::builder()
            .method("POST")
            .uri("http://example.com/items?limit=5")
            .header("x-request-id", "abc")
            .body(())
            .unwrap()
            .into_parts();

        let req = Request::from_parts(parts, Bytes::from_static(b"payload"));
        assert_eq!(req.method(), "POST");
        assert_eq!(req.url(), "/items?limit=5");
        assert_eq!(req.header("X-Request-Id"), Some("abc"));
        assert_eq!(req.body(), b"payload");
    }
}

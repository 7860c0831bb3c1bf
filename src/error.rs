//! Unified error type.

use std::any::Any;
use std::net::AddrParseError;

/// Boxed error a middleware can fail with.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type of relay.
///
/// Two families live here. Infrastructure failures (binding a port, accepting
/// a connection) surface from [`Server`](crate::Server). Middleware failures
/// never surface at all: the executor turns them into a `500` response and
/// reports them through [`Outcome::Failed`](crate::Outcome::Failed).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("invalid socket address `{addr}`: {source}")]
    Addr {
        addr: String,
        #[source]
        source: AddrParseError,
    },

    /// A middleware failed with a plain message.
    #[error("{0}")]
    Message(String),

    /// A middleware failed with its own error type.
    #[error("{0}")]
    Middleware(#[source] BoxError),

    /// A middleware panicked while being invoked or polled.
    #[error("{0}")]
    Panic(String),
}

impl Error {
    /// Fails with a plain message: `return next.fail(Error::msg("no session"))`.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Wraps any error type.
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Middleware(Box::new(err))
    }

    /// Text written as the body of the `500` fallback.
    pub fn message(&self) -> String {
        let text = self.to_string();
        if text.is_empty() {
            "Internal Server Error".to_owned()
        } else {
            text
        }
    }

    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        if let Some(text) = payload.downcast_ref::<&str>() {
            Self::Panic((*text).to_owned())
        } else if let Some(text) = payload.downcast_ref::<String>() {
            Self::Panic(text.clone())
        } else {
            Self::Panic(String::new())
        }
    }
}

impl From<BoxError> for Error {
    fn from(err: BoxError) -> Self {
        Self::Middleware(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_falls_back_when_empty() {
        assert_eq!(Error::msg("").message(), "Internal Server Error");
        assert_eq!(Error::Panic(String::new()).message(), "Internal Server Error");
        assert_eq!(Error::msg("boom").message(), "boom");
    }

    #[test]
    fn wrapped_errors_keep_their_text() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        assert_eq!(Error::new(io).message(), "disk gone");

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        assert_eq!(Error::from(io).message(), "disk gone");
    }

    #[test]
    fn panic_payloads_are_stringified() {
        let static_str: Box<dyn Any + Send> = Box::new("static");
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let other: Box<dyn Any + Send> = Box::new(42_u8);

        assert_eq!(Error::from_panic(static_str).message(), "static");
        assert_eq!(Error::from_panic(owned).message(), "owned");
        assert_eq!(Error::from_panic(other).message(), "Internal Server Error");
    }
}

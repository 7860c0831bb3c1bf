//! Built-in middleware.
//!
//! Middleware intercept requests and responses and are the right place for
//! cross-cutting concerns: structured tracing, request-id injection, and
//! authentication-header inspection. Register them with
//! [`Stack::register_middleware`](crate::Stack::register_middleware), usually
//! first so they wrap everything registered after them.
//!
//! - [`Trace`] — per-request span with method, url, status, latency

mod trace;

pub use trace::Trace;

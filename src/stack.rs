//! Middleware stack builder.
//!
//! An ordered, append-only list of middleware. Registration order is
//! execution order. Route and method registration are not a separate router:
//! they wrap the given function in a middleware that checks the request and
//! passes control on when it does not match.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::warn;

use crate::error::Error;
use crate::executor::Next;
use crate::handler::{BoxFuture, BoxedMiddleware, Handler, Middleware};
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;

/// The application's middleware stack.
///
/// Build it at startup, then hand it to [`Server::serve`](crate::Server::serve)
/// or call [`execute`](Stack::execute) yourself. The first execution freezes
/// the stack: later registrations are ignored.
///
/// ```rust
/// use relay::{Stack, StatusCode};
///
/// let mut stack = Stack::new();
/// stack
///     .register(|req, res, next| Box::pin(async move {
///         res.set_header("x-served-by", "relay");
///         next.run(req, res).await
///     }))
///     .get("/hello", |_req, res| Box::pin(async move {
///         res.text(StatusCode::OK, "hello");
///         Ok(())
///     }));
/// assert_eq!(stack.len(), 2);
/// ```
#[derive(Default)]
pub struct Stack {
    chain: Vec<BoxedMiddleware>,
    frozen: AtomicBool,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware closure or function.
    pub fn register<F>(&mut self, f: F) -> &mut Self
    where
        F: for<'a> Fn(&'a Request, &'a mut Response, Next<'a>) -> BoxFuture<'a, Result<(), Error>>
            + Send
            + Sync
            + 'static,
    {
        self.push(Arc::new(f))
    }

    /// Appends a middleware value, e.g. [`middleware::Trace`](crate::middleware::Trace).
    pub fn register_middleware(&mut self, middleware: impl Middleware) -> &mut Self {
        self.push(Arc::new(middleware))
    }

    /// Appends `f`, run only when the request's first path segment is `path`.
    ///
    /// `register_for_path("/users", f)` runs `f` for `/users` and `/users/42`,
    /// not for `/users-admin` or `/`. Other requests skip straight to the next
    /// middleware.
    pub fn register_for_path<F>(&mut self, path: &str, f: F) -> &mut Self
    where
        F: for<'a> Fn(&'a Request, &'a mut Response, Next<'a>) -> BoxFuture<'a, Result<(), Error>>
            + Send
            + Sync
            + 'static,
    {
        self.push(Arc::new(PathScoped { path: path.to_owned(), inner: f }))
    }

    /// Appends a method handler for `method` on the first path segment `path`.
    ///
    /// `method` is a [`Method`] or any method name; either way it is compared
    /// with the request method ignoring case, so `"BREW"` routes too.
    ///
    /// On a match the handler runs and the chain then continues; since the
    /// chain stops as soon as headers are sent, a handler that answers is in
    /// practice the last thing to run.
    pub fn register_for_method<H>(&mut self, method: impl AsRef<str>, path: &str, handler: H) -> &mut Self
    where
        H: for<'a> Fn(&'a Request, &'a mut Response) -> BoxFuture<'a, Result<(), Error>>
            + Send
            + Sync
            + 'static,
    {
        let method = method.as_ref().to_ascii_lowercase();
        self.push(Arc::new(MethodRoute { method, path: path.to_owned(), handler }))
    }

    /// Shorthand for [`register_for_method`](Stack::register_for_method).
    pub fn on<H>(&mut self, method: impl AsRef<str>, path: &str, handler: H) -> &mut Self
    where
        H: for<'a> Fn(&'a Request, &'a mut Response) -> BoxFuture<'a, Result<(), Error>>
            + Send
            + Sync
            + 'static,
    {
        self.register_for_method(method, path, handler)
    }

    pub fn get<H>(&mut self, path: &str, handler: H) -> &mut Self
    where
        H: for<'a> Fn(&'a Request, &'a mut Response) -> BoxFuture<'a, Result<(), Error>>
            + Send
            + Sync
            + 'static,
    {
        self.register_for_method(Method::Get, path, handler)
    }

    pub fn post<H>(&mut self, path: &str, handler: H) -> &mut Self
    where
        H: for<'a> Fn(&'a Request, &'a mut Response) -> BoxFuture<'a, Result<(), Error>>
            + Send
            + Sync
            + 'static,
    {
        self.register_for_method(Method::Post, path, handler)
    }

    pub fn put<H>(&mut self, path: &str, handler: H) -> &mut Self
    where
        H: for<'a> Fn(&'a Request, &'a mut Response) -> BoxFuture<'a, Result<(), Error>>
            + Send
            + Sync
            + 'static,
    {
        self.register_for_method(Method::Put, path, handler)
    }

    pub fn delete<H>(&mut self, path: &str, handler: H) -> &mut Self
    where
        H: for<'a> Fn(&'a Request, &'a mut Response) -> BoxFuture<'a, Result<(), Error>>
            + Send
            + Sync
            + 'static,
    {
        self.register_for_method(Method::Delete, path, handler)
    }

    pub fn patch<H>(&mut self, path: &str, handler: H) -> &mut Self
    where
        H: for<'a> Fn(&'a Request, &'a mut Response) -> BoxFuture<'a, Result<(), Error>>
            + Send
            + Sync
            + 'static,
    {
        self.register_for_method(Method::Patch, path, handler)
    }

    pub fn head<H>(&mut self, path: &str, handler: H) -> &mut Self
    where
        H: for<'a> Fn(&'a Request, &'a mut Response) -> BoxFuture<'a, Result<(), Error>>
            + Send
            + Sync
            + 'static,
    {
        self.register_for_method(Method::Head, path, handler)
    }

    pub fn options<H>(&mut self, path: &str, handler: H) -> &mut Self
    where
        H: for<'a> Fn(&'a Request, &'a mut Response) -> BoxFuture<'a, Result<(), Error>>
            + Send
            + Sync
            + 'static,
    {
        self.register_for_method(Method::Options, path, handler)
    }

    /// Stops accepting registrations. Called by the first execution.
    pub fn freeze(&self) {
        self.frozen.store(true, Ordering::Release);
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub(crate) fn chain(&self) -> &[BoxedMiddleware] {
        &self.chain
    }

    fn push(&mut self, middleware: BoxedMiddleware) -> &mut Self {
        if self.is_frozen() {
            warn!("stack is frozen, registration ignored");
            return self;
        }
        self.chain.push(middleware);
        self
    }
}

// ── Route wrappers ────────────────────────────────────────────────────────────

/// Runs `inner` only on requests whose first path segment is `path`.
struct PathScoped<M> {
    path: String,
    inner: M,
}

impl<M: Middleware> Middleware for PathScoped<M> {
    fn call<'a>(
        &'a self,
        req: &'a Request,
        res: &'a mut Response,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<(), Error>> {
        if req.segment() == self.path {
            Middleware::call(&self.inner, req, res, next)
        } else {
            next.run(req, res)
        }
    }
}

/// Runs `handler` on a method + first-segment match, then continues.
struct MethodRoute<H> {
    /// Lowercase method name.
    method: String,
    path: String,
    handler: H,
}

impl<H: Handler> Middleware for MethodRoute<H> {
    fn call<'a>(
        &'a self,
        req: &'a Request,
        res: &'a mut Response,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<(), Error>> {
        if !(req.method().eq_ignore_ascii_case(&self.method) && req.segment() == self.path) {
            return next.run(req, res);
        }
        Box::pin(async move {
            Handler::call(&self.handler, req, &mut *res).await?;
            next.run(req, res).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pass<'a>(req: &'a Request, res: &'a mut Response, next: Next<'a>) -> BoxFuture<'a, Result<(), Error>> {
        next.run(req, res)
    }

    #[test]
    fn registration_appends_in_order() {
        let mut stack = Stack::new();
        stack.register(pass).register_for_path("/a", pass);
        stack.get("/b", |_req, _res| Box::pin(async { Ok(()) }));

        assert_eq!(stack.len(), 3);
        assert!(!stack.is_frozen());
    }

    #[test]
    fn frozen_stack_ignores_registration() {
        let mut stack = Stack::new();
        stack.register(pass);
        stack.freeze();
        stack.register(pass).register_for_path("/a", pass);
        stack.post("/b", |_req, _res| Box::pin(async { Ok(()) }));

        assert!(stack.is_frozen());
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn stacks_freeze_independently() {
        let first = Stack::new();
        let second = Stack::new();
        first.freeze();

        assert!(first.is_frozen());
        assert!(!second.is_frozen());
    }
}

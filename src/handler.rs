//! Middleware and handler traits, and their type erasure.
//!
//! # How middleware are stored
//!
//! The stack holds middleware of *different* concrete types in one `Vec`, so
//! each one is erased behind `Arc<dyn Middleware>`:
//!
//! ```text
//! |req, res, next| Box::pin(async move { … })   ← user writes this
//!        ↓ stack.register(f)
//! Arc::new(f)                                    ← BoxedMiddleware
//!        ↓ at request time
//! mw.call(&req, &mut res, next)                  ← one vtable dispatch
//!        ↓
//! BoxFuture<'_, Result<(), Error>>               ← awaited by the executor
//! ```
//!
//! Middleware borrow the request and the response sink for the duration of
//! their future, which is why they return a boxed future tied to that borrow
//! instead of being plain `async fn`s.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::Error;
use crate::executor::Next;
use crate::request::Request;
use crate::response::Response;

/// A heap-allocated, type-erased future borrowing the current request.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A type-erased middleware shared by every concurrent execution of a stack.
pub(crate) type BoxedMiddleware = Arc<dyn Middleware>;

/// One link of the chain.
///
/// A middleware receives the request, the response sink, and the [`Next`]
/// continuation for its position. It can pass control on with
/// `next.run(req, res).await`, end the chain by answering without touching
/// `next`, skip the rest of the route with `next.skip_route()`, or fail with
/// `next.fail(err)` / any `Err`.
///
/// Closures with the right shape implement this trait automatically. Struct
/// middleware implement it by hand, see [`middleware::Trace`](crate::middleware::Trace).
pub trait Middleware: Send + Sync + 'static {
    fn call<'a>(
        &'a self,
        req: &'a Request,
        res: &'a mut Response,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<(), Error>>;
}

impl<F> Middleware for F
where
    F: for<'a> Fn(&'a Request, &'a mut Response, Next<'a>) -> BoxFuture<'a, Result<(), Error>>
        + Send
        + Sync
        + 'static,
{
    fn call<'a>(
        &'a self,
        req: &'a Request,
        res: &'a mut Response,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<(), Error>> {
        (self)(req, res, next)
    }
}

/// A terminal method handler: a middleware without a continuation.
///
/// Registered through [`Stack::on`](crate::Stack::on) and its `get`/`post`/…
/// shortcuts, which decide when to run it and continue the chain afterwards.
pub trait Handler: Send + Sync + 'static {
    fn call<'a>(&'a self, req: &'a Request, res: &'a mut Response) -> BoxFuture<'a, Result<(), Error>>;
}

impl<F> Handler for F
where
    F: for<'a> Fn(&'a Request, &'a mut Response) -> BoxFuture<'a, Result<(), Error>>
        + Send
        + Sync
        + 'static,
{
    fn call<'a>(&'a self, req: &'a Request, res: &'a mut Response) -> BoxFuture<'a, Result<(), Error>> {
        (self)(req, res)
    }
}

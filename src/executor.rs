//! Chain execution.
//!
//! One call to [`Stack::execute`] drives one request through the frozen
//! middleware sequence. All per-request state lives in that call's future:
//! the request, the response sink, and the [`Next`] handed to the running
//! middleware. Nothing is written back to the [`Stack`], so any number of
//! executions can share it.
//!
//! ```text
//! RUNNING(0) ──next.run()──▶ RUNNING(1) ──next.run()──▶ … ──▶ DONE
//!     │                          │
//!     │ next.skip_route()        │ Err / panic
//!     ▼                          ▼
//!    DONE                     FAILED
//! ```
//!
//! `DONE` with nothing sent writes the `404` fallback; `FAILED` writes the
//! `500` fallback.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use http::StatusCode;
use tracing::{debug, error, warn};

use crate::error::Error;
use crate::handler::{BoxFuture, BoxedMiddleware};
use crate::request::Request;
use crate::response::Response;
use crate::stack::Stack;

/// How an execution ended.
#[derive(Debug)]
pub enum Outcome {
    /// A middleware sent the response.
    Handled,
    /// The chain ended with nothing sent; the `404` fallback was written.
    NotFound,
    /// A middleware failed. The `500` fallback was written unless headers had
    /// already gone out.
    Failed(Error),
}

/// The continuation handed to a middleware.
///
/// It is bound to the position of the middleware that received it and is
/// consumed by whichever of [`run`](Next::run), [`skip_route`](Next::skip_route)
/// or [`fail`](Next::fail) the middleware picks, so a step can only continue
/// once. Dropping it without calling any of them ends the chain.
///
/// Each `run` nests the next middleware's future inside the current one, so
/// stack depth grows with chain length; a few thousand pass-through
/// middleware can exhaust a small thread stack.
pub struct Next<'a> {
    chain: &'a [BoxedMiddleware],
    index: usize,
}

impl<'a> Next<'a> {
    /// Runs the rest of the chain and resolves once it has finished.
    ///
    /// Does nothing if the response headers were already sent or if this was
    /// the last middleware. An `Err` means a later middleware failed; return it
    /// (`?`) to let the executor answer with a `500`, or handle it here.
    pub fn run(self, req: &'a Request, res: &'a mut Response) -> BoxFuture<'a, Result<(), Error>> {
        if res.headers_sent() {
            debug!(index = self.index, "headers sent, chain stopped");
            return Box::pin(async { Ok(()) });
        }
        invoke(self.chain, self.index + 1, req, res)
    }

    /// Ends the chain without running the remaining middleware.
    ///
    /// Unless something was already sent, the request falls through to the
    /// `404` fallback exactly as if the chain had run out.
    pub fn skip_route(self) -> Result<(), Error> {
        debug!(index = self.index, "route skipped");
        Ok(())
    }

    /// Fails the request; return the result from the middleware.
    pub fn fail(self, err: impl Into<Error>) -> Result<(), Error> {
        Err(err.into())
    }

    /// Position of the middleware holding this continuation.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Invokes the middleware at `index`, or resolves immediately past the end.
///
/// This is the single place a middleware is called, so it is also where its
/// panics are caught: both while the middleware builds its future and while
/// that future is polled.
fn invoke<'a>(
    chain: &'a [BoxedMiddleware],
    index: usize,
    req: &'a Request,
    res: &'a mut Response,
) -> BoxFuture<'a, Result<(), Error>> {
    let Some(middleware) = chain.get(index) else {
        debug!(index, "end of chain");
        return Box::pin(async { Ok(()) });
    };

    debug!(index, "running middleware");
    let next = Next { chain, index };
    let step = AssertUnwindSafe(async move { middleware.call(req, res, next).await });

    Box::pin(async move {
        match step.catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(Error::from_panic(payload)),
        }
    })
}

impl Stack {
    /// Runs `req` through the stack, writing into `res`.
    ///
    /// The first call freezes the stack. Resolves once the request is fully
    /// handled: by a middleware, by the `404` fallback
    /// (`path <url> not found`), or by the `500` fallback carrying the error
    /// message. Middleware failures are reported through the [`Outcome`], never
    /// propagated.
    pub async fn execute(&self, req: &Request, res: &mut Response) -> Outcome {
        self.freeze();

        let chain = self.chain();
        if chain.is_empty() {
            warn!("no middleware registered, register middleware before calling execute()");
        }

        match invoke(chain, 0, req, &mut *res).await {
            Ok(()) if res.headers_sent() => Outcome::Handled,
            Ok(()) => {
                debug!(url = req.url(), "no middleware answered");
                res.text(StatusCode::NOT_FOUND, format!("path {} not found", req.url()));
                Outcome::NotFound
            }
            Err(err) => {
                if res.headers_sent() {
                    error!(url = req.url(), error = %err, "middleware failed after headers were sent");
                    if !res.is_finished() {
                        res.end("");
                    }
                } else {
                    error!(url = req.url(), error = %err, "middleware failed");
                    res.text(StatusCode::INTERNAL_SERVER_ERROR, err.message());
                }
                Outcome::Failed(err)
            }
        }
    }
}

//! Request tracing middleware.

use std::time::Instant;

use tracing::{Instrument, error, info, info_span};

use crate::error::Error;
use crate::executor::Next;
use crate::handler::{BoxFuture, Middleware};
use crate::request::Request;
use crate::response::Response;

/// Opens a span per request and logs one event once the rest of the chain
/// has finished.
///
/// Register it first: it only observes the middleware registered after it.
/// The `404`/`500` fallbacks are written after the whole chain returns, so a
/// request nobody answered is logged with `sent = false`.
///
/// ```rust
/// use relay::{Stack, middleware::Trace};
///
/// let mut stack = Stack::new();
/// stack.register_middleware(Trace::new());
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Trace {
    _priv: (),
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Middleware for Trace {
    fn call<'a>(
        &'a self,
        req: &'a Request,
        res: &'a mut Response,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<(), Error>> {
        let span = info_span!("request", method = req.method(), url = req.url());
        Box::pin(
            async move {
                let started = Instant::now();
                let result = next.run(req, &mut *res).await;
                let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

                match &result {
                    Ok(()) => info!(
                        status = res.status().as_u16(),
                        sent = res.headers_sent(),
                        latency_ms,
                        "request finished"
                    ),
                    Err(err) => error!(error = %err, latency_ms, "request failed"),
                }
                result
            }
            .instrument(span),
        )
    }
}

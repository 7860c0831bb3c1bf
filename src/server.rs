//! HTTP transport and graceful shutdown.
//!
//! The engine itself only needs a [`Request`] and a [`Response`] sink. This
//! module is the hyper binding that produces them: one fresh sink per request,
//! one [`Stack::execute`] per request, all executions sharing the same frozen
//! stack.
//!
//! # Graceful shutdown
//!
//! On **SIGTERM** or **Ctrl-C** the server:
//! 1. Immediately stops `listener.accept()` — no new connections are made.
//! 2. Lets every in-flight connection task run to completion.
//! 3. Returns from [`Server::serve`], which lets `main` exit cleanly.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use crate::stack::Stack;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Example
    ///
    /// ```rust
    /// use relay::Server;
    /// let server = Server::bind("0.0.0.0:3000").unwrap();
    /// assert!(Server::bind("not an address").is_err());
    /// ```
    pub fn bind(addr: &str) -> Result<Self, Error> {
        let parsed = addr.parse().map_err(|source| Error::Addr { addr: addr.to_owned(), source })?;
        Ok(Self { addr: parsed })
    }

    /// Binds the listener and serves `stack` on it.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by all in-flight requests completing).
    pub async fn serve(self, stack: Stack) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        Self::serve_listener(listener, stack).await
    }

    /// Serves `stack` on an already bound listener.
    pub async fn serve_listener(listener: TcpListener, stack: Stack) -> Result<(), Error> {
        // Frozen before the first connection so that no request ever sees a
        // different chain than another.
        stack.freeze();
        let stack = Arc::new(stack);

        info!(addr = %listener.local_addr()?, middleware = stack.len(), "relay listening");

        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Shutdown first: a SIGTERM stops accepting even if more
                // connections are queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let stack = Arc::clone(&stack);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection.
                        let svc = service_fn(move |req| {
                            let stack = Arc::clone(&stack);
                            async move { dispatch(stack, req).await }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("relay stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Runs one hyper request through the stack.
///
/// Infallible: the executor already turns every middleware failure into a
/// response, so hyper never sees an error.
async fn dispatch(
    stack: Arc<Stack>,
    req: hyper::Request<Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(url = %parts.uri, "failed to read request body: {e}");
            let mut res = Response::new();
            res.text(StatusCode::BAD_REQUEST, "invalid request body");
            return Ok(res.into_inner());
        }
    };

    let request = Request::from_parts(parts, body);
    let mut response = Response::new();
    stack.execute(&request, &mut response).await;

    Ok(response.into_inner())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// A signal whose handler cannot be installed never resolves; the other one
/// still does.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}

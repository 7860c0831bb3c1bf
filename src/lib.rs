//! # relay
//!
//! An ordered chain of middleware that cooperatively handle one request.
//!
//! ## The contract
//!
//! Every middleware gets the request, the response sink, and a [`Next`]
//! continuation. It either passes control on, answers and stops, skips the
//! rest of the route, or fails. The executor runs them strictly one at a time,
//! in registration order, and settles every request one way or another:
//!
//! - a middleware sent the response — done;
//! - nobody answered — `404`, `text/plain`, body `path <url> not found`;
//! - a middleware failed, returned `Err` or panicked — `500`, `text/plain`,
//!   body is the error message.
//!
//! Routing is deliberately thin: [`Stack::register_for_path`] and the
//! `get`/`post`/… helpers match the *first path segment* only and are ordinary
//! middleware underneath.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use relay::{Error, Next, Request, Response, Server, Stack, StatusCode, middleware::Trace};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let mut app = Stack::new();
//!     app.register_middleware(Trace::new())
//!         .register(require_token)
//!         .get("/users", |req, res| Box::pin(async move {
//!             res.text(StatusCode::OK, format!("you asked for {}", req.url()));
//!             Ok(())
//!         }));
//!
//!     Server::bind("0.0.0.0:3000")?.serve(app).await
//! }
//!
//! fn require_token<'a>(
//!     req: &'a Request,
//!     res: &'a mut Response,
//!     next: Next<'a>,
//! ) -> relay::BoxFuture<'a, Result<(), Error>> {
//!     Box::pin(async move {
//!         if req.header("authorization").is_none() {
//!             res.text(StatusCode::UNAUTHORIZED, "missing token");
//!             return Ok(());
//!         }
//!         next.run(req, res).await
//!     })
//! }
//! ```

mod error;
mod executor;
mod handler;
mod method;
mod request;
mod response;
mod server;
mod stack;

pub mod middleware;

pub use error::{BoxError, Error};
pub use executor::{Next, Outcome};
pub use handler::{BoxFuture, Handler, Middleware};
pub use http::StatusCode;
pub use method::{Method, UnknownMethod};
pub use request::Request;
pub use response::Response;
pub use server::Server;
pub use stack::Stack;

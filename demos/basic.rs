//! Minimal relay example — a tracing layer, an auth gate, and a few routes.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl -X POST http://localhost:3000/users -d '{"name":"alice"}'
//!   curl http://localhost:3000/admin                          # 401
//!   curl -H 'authorization: secret' http://localhost:3000/admin
//!   curl http://localhost:3000/nope                           # 404

use relay::{BoxFuture, Error, Next, Request, Response, Server, Stack, StatusCode, middleware::Trace};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let mut app = Stack::new();
    app.register_middleware(Trace::new())
        .register_for_path("/admin", require_token)
        .get("/admin", |_req, res| Box::pin(async move {
            res.text(StatusCode::OK, "welcome back");
            Ok(())
        }))
        .get("/users", get_user)
        .post("/users", create_user);

    Server::bind("0.0.0.0:3000")?.serve(app).await
}

// Any /admin/... request without an authorization header stops here.
fn require_token<'a>(req: &'a Request, res: &'a mut Response, next: Next<'a>) -> BoxFuture<'a, Result<(), Error>> {
    Box::pin(async move {
        if req.header("authorization") != Some("secret") {
            res.text(StatusCode::UNAUTHORIZED, "missing or invalid token");
            return Ok(());
        }
        next.run(req, res).await
    })
}

// GET /users/<id>
fn get_user<'a>(req: &'a Request, res: &'a mut Response) -> BoxFuture<'a, Result<(), Error>> {
    Box::pin(async move {
        let id = req.url().split('/').nth(2).unwrap_or("unknown");
        res.write_head(StatusCode::OK, &[("content-type", "application/json")]);
        res.end(format!(r#"{{"id":"{id}","name":"alice"}}"#));
        Ok(())
    })
}

// POST /users
fn create_user<'a>(req: &'a Request, res: &'a mut Response) -> BoxFuture<'a, Result<(), Error>> {
    Box::pin(async move {
        if req.body().is_empty() {
            return Err(Error::msg("request body is required"));
        }
        res.write_head(
            StatusCode::CREATED,
            &[("content-type", "application/json"), ("location", "/users/99")],
        );
        res.end(r#"{"id":"99","name":"new_user"}"#);
        Ok(())
    })
}

use std::net::SocketAddr;
use std::time::Duration;

use relay::{Error, Server, Stack, StatusCode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

async fn start(stack: Stack) -> SocketAddr {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = Server::serve_listener(listener, stack).await;
    });
    addr
}

/// Sends one raw HTTP/1.1 request and returns the whole response text.
async fn roundtrip(addr: SocketAddr, method: &str, path: &str, body: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "{method} {path} HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\ncontent-length: {}\r\n\r\n{body}",
        body.len(),
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut raw))
        .await
        .expect("server did not close the connection")
        .unwrap();
    String::from_utf8(raw).unwrap()
}

fn app() -> Stack {
    let mut stack = Stack::new();
    stack
        .post("/echo", |req, res| Box::pin(async move {
            res.write_head(StatusCode::CREATED, &[("content-type", "text/plain"), ("x-method", req.method())]);
            res.end(req.body());
            Ok(())
        }))
        .register_for_path("/boom", |_req, _res, next| Box::pin(async move {
            next.fail(Error::msg("boom went the middleware"))
        }));
    stack
}

#[tokio::test]
async fn serves_matching_route() {
    let addr = start(app()).await;

    let response = roundtrip(addr, "POST", "/echo", "hello relay").await;

    assert!(response.starts_with("HTTP/1.1 201"), "{response}");
    assert!(response.to_ascii_lowercase().contains("x-method: post"), "{response}");
    assert!(response.ends_with("hello relay"), "{response}");
}

#[tokio::test]
async fn answers_not_found_when_nothing_matches() {
    let addr = start(app()).await;

    let response = roundtrip(addr, "GET", "/missing?page=2", "").await;

    assert!(response.starts_with("HTTP/1.1 404"), "{response}");
    assert!(response.to_ascii_lowercase().contains("content-type: text/plain"), "{response}");
    assert!(response.ends_with("path /missing?page=2 not found"), "{response}");
}

#[tokio::test]
async fn answers_internal_server_error_on_failure() {
    let addr = start(app()).await;

    let response = roundtrip(addr, "GET", "/boom", "").await;

    assert!(response.starts_with("HTTP/1.1 500"), "{response}");
    assert!(response.ends_with("boom went the middleware"), "{response}");
}

#[tokio::test]
async fn bind_rejects_invalid_addresses() {
    assert!(matches!(Server::bind("localhost"), Err(Error::Addr { .. })));
    assert!(Server::bind("127.0.0.1:8080").is_ok());
}

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use net::{FetchConfig, Fetcher, HttpFetcher, NetError};
use url::Url;

/// Serve exactly one response on a fresh local port and hand back the request head.
fn serve_once(status_line: &'static str, body: &'static [u8]) -> (Url, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).expect("read request");
            if n == 0 {
                break;
            }
            head.extend_from_slice(&buf[..n]);
        }
        let header = format!(
            "{status_line}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        stream.write_all(header.as_bytes()).expect("write head");
        stream.write_all(body).expect("write body");
        String::from_utf8_lossy(&head).into_owned()
    });
    let url = Url::parse(&format!("http://{addr}/index.html")).expect("url");
    (url, handle)
}

fn local() -> FetchConfig {
    FetchConfig::default().with_no_proxy()
}

fn closed_port_url() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    Url::parse(&format!("http://{addr}/")).expect("url")
}

#[test]
fn fetches_full_body_bytes() {
    let (url, server) = serve_once("HTTP/1.1 200 OK", b"<html>ok</html>");
    let fetcher = HttpFetcher::new(local()).expect("client");

    let body = fetcher.get(&url).expect("fetch");
    assert_eq!(body, b"<html>ok</html>");

    let head = server.join().expect("server");
    assert!(head.starts_with("GET /index.html HTTP/1.1\r\n"), "{head}");
}

#[test]
fn sends_configured_user_agent() {
    let (url, server) = serve_once("HTTP/1.1 200 OK", b"");
    let config = local().with_user_agent("fetchview-test/1");
    let fetcher = HttpFetcher::new(config).expect("client");

    fetcher.get(&url).expect("fetch");

    let head = server.join().expect("server").to_ascii_lowercase();
    assert!(head.contains("user-agent: fetchview-test/1"), "{head}");
}

#[test]
fn error_status_still_yields_body() {
    let (url, server) = serve_once("HTTP/1.1 404 Not Found", b"<h1>missing</h1>");
    let fetcher = HttpFetcher::new(local()).expect("client");

    assert_eq!(fetcher.get(&url).expect("fetch"), b"<h1>missing</h1>");
    server.join().expect("server");
}

#[test]
fn refused_connection_is_transport_error() {
    let fetcher = HttpFetcher::new(local().with_timeout(Duration::from_secs(5)))
        .expect("client");

    let err = fetcher.get(&closed_port_url()).expect_err("must fail");
    assert!(matches!(err, NetError::Transport(_)), "{err:?}");
}

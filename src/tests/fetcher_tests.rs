use crate::config::FetchConfig;
use crate::scraper::fetcher::PageFetcher;
use crate::scraper::{HttpFetcher, ScraperError};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

/// Answer a single request on a loopback port with `response` and hand back
/// the raw request head.
fn serve_once(response: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/b-ottawa/l1700185?page=1", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            head.extend_from_slice(&buf[..n]);
        }
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
        String::from_utf8_lossy(&head).to_lowercase()
    });

    (url, handle)
}

fn fetch_config() -> FetchConfig {
    FetchConfig {
        user_agent: "listing-scraper-test/1.0".to_string(),
        accept_language: "fr-CA,fr;q=0.8".to_string(),
        timeout_secs: 5,
    }
}

#[test]
fn non_success_status_is_an_http_status_error() {
    let (url, server) = serve_once(
        "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
    );

    let fetcher = HttpFetcher::new(&fetch_config()).unwrap();
    let result = fetcher.fetch(&url);
    server.join().unwrap();

    match result {
        Err(ScraperError::HttpStatus { status, url: failed }) => {
            assert_eq!(status, 503);
            assert_eq!(failed, url);
        }
        other => panic!("expected HTTP status error, got {other:?}"),
    }
}

#[test]
fn requests_carry_user_agent_and_accept_language() {
    let (url, server) = serve_once(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 13\r\nConnection: close\r\n\r\n<p>hello</p>\n",
    );

    let fetcher = HttpFetcher::new(&fetch_config()).unwrap();
    let body = fetcher.fetch(&url).unwrap();
    let request = server.join().unwrap();

    assert_eq!(body, "<p>hello</p>\n");
    assert!(request.starts_with("get /b-ottawa/l1700185?page=1 "));
    assert!(request.contains("user-agent: listing-scraper-test/1.0"));
    assert!(request.contains("accept-language: fr-ca,fr;q=0.8"));
}

#[test]
fn unreachable_host_is_a_network_error() {
    // Bind then drop to get a loopback port with nothing listening.
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    let fetcher = HttpFetcher::new(&fetch_config()).unwrap();
    assert!(matches!(
        fetcher.fetch(&format!("http://127.0.0.1:{port}/")),
        Err(ScraperError::Network(_))
    ));
}

#[test]
fn invalid_accept_language_is_a_config_error() {
    let config = FetchConfig {
        accept_language: "en\nX-Injected: 1".to_string(),
        ..fetch_config()
    };
    assert!(matches!(HttpFetcher::new(&config), Err(ScraperError::Config(_))));
}

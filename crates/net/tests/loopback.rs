use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;

use net::{FORM_CONTENT_TYPE, HttpTransport, NetConfig, NetError, PendingRequest, Transport};

struct Captured {
    request_line: String,
    headers: Vec<String>,
    body: String,
}

/// Serve exactly one request with `status` and `body`, reporting what was received.
fn serve_once(status: &'static str, body: &'static str) -> (String, mpsc::Receiver<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let Ok((stream, _)) = listener.accept() else {
            return;
        };
        let mut reader = BufReader::new(stream);
        let mut request_line = String::new();
        reader.read_line(&mut request_line).expect("request line");
        let mut headers = Vec::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).expect("header");
            let line = line.trim_end().to_string();
            if line.is_empty() {
                break;
            }
            if let Some((k, v)) = line.split_once(':')
                && k.eq_ignore_ascii_case("content-length")
            {
                content_length = v.trim().parse().unwrap_or(0);
            }
            headers.push(line.to_ascii_lowercase());
        }
        let mut buf = vec![0u8; content_length];
        reader.read_exact(&mut buf).expect("body");
        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: text/html; charset=utf-8\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        let mut stream = reader.into_inner();
        stream.write_all(response.as_bytes()).expect("write");
        let _ = tx.send(Captured {
            request_line: request_line.trim_end().to_string(),
            headers,
            body: String::from_utf8_lossy(&buf).into_owned(),
        });
    });
    (format!("http://{addr}"), rx)
}

#[test]
fn form_post_sends_body_and_content_type() {
    let (base, rx) = serve_once("200 OK", "<div>ok</div>");
    let transport = HttpTransport::new(&NetConfig::default()).expect("client");
    let url = format!("{base}/save");

    let result = transport
        .execute(&PendingRequest::post_form(url.clone(), "a=1&b=x%20y".to_string()))
        .expect("fetch");

    assert_eq!(result.status, 200);
    assert!(result.is_ok());
    assert_eq!(result.body, "<div>ok</div>");
    assert_eq!(result.requested_url, url);
    assert!(html_content_type(&result.content_type));

    let seen = rx.recv().expect("captured");
    assert_eq!(seen.request_line, "POST /save HTTP/1.1");
    assert!(
        seen.headers
            .contains(&format!("content-type: {}", FORM_CONTENT_TYPE.to_ascii_lowercase()))
    );
    assert!(seen.headers.iter().any(|h| h.starts_with("user-agent: hypersplice/")));
    assert_eq!(seen.body, "a=1&b=x%20y");
}

fn html_content_type(ct: &Option<String>) -> bool {
    ct.as_deref().is_some_and(|v| v.starts_with("text/html"))
}

#[test]
fn server_error_is_a_response_not_a_transport_error() {
    let (base, _rx) = serve_once("500 Internal Server Error", "boom");
    let transport = HttpTransport::new(&NetConfig::default()).expect("client");
    let result = transport
        .execute(&PendingRequest::get(format!("{base}/page2")))
        .expect("fetch");
    assert_eq!(result.status, 500);
    assert!(!result.is_ok());
    assert_eq!(result.body, "boom");
}

#[test]
fn refused_connection_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let transport = HttpTransport::new(&NetConfig::default()).expect("client");
    let err = transport
        .execute(&PendingRequest::get(format!("http://{addr}/")))
        .expect_err("nothing listens");
    assert!(matches!(err, NetError::Transport { .. }));
}

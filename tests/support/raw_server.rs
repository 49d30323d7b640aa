//! Single-shot HTTP servers that misbehave in ways wiremock cannot.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::Duration;

/// Serves exactly one request with `head` followed by `body`, then closes.
///
/// `head` must include the status line and headers, without the blank line.
#[must_use]
pub fn serve_once(head: String, body: Vec<u8>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind raw server");
    let addr = listener.local_addr().expect("raw server address");

    thread::spawn(move || {
        let Some(mut stream) = accept_request(&listener) else {
            return;
        };
        let _ = stream.write_all(head.as_bytes());
        let _ = stream.write_all(b"\r\n\r\n");
        let _ = stream.write_all(&body);
        let _ = stream.flush();
        thread::sleep(Duration::from_millis(50));
    });

    addr
}

/// Sends `first` right away and holds `rest` back until the returned sender fires.
///
/// The response declares `first.len() + rest.len()` bytes.
#[must_use]
pub fn serve_in_two_parts(first: &[u8], rest: &[u8]) -> (SocketAddr, Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind raw server");
    let addr = listener.local_addr().expect("raw server address");
    let (release, released) = mpsc::channel();
    let first = first.to_vec();
    let rest = rest.to_vec();

    thread::spawn(move || {
        let Some(mut stream) = accept_request(&listener) else {
            return;
        };
        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            first.len() + rest.len()
        );
        let _ = stream.write_all(head.as_bytes());
        let _ = stream.write_all(&first);
        let _ = stream.flush();
        if released.recv_timeout(Duration::from_secs(10)).is_err() {
            return;
        }
        // The client may already have hung up.
        let _ = stream.write_all(&rest);
        let _ = stream.flush();
        thread::sleep(Duration::from_millis(50));
    });

    (addr, release)
}

fn accept_request(listener: &TcpListener) -> Option<TcpStream> {
    let (mut stream, _) = listener.accept().ok()?;
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return None,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }
    Some(stream)
}

/// Announces `declared_len` bytes but sends only `body` before closing.
#[must_use]
pub fn serve_truncated_body(declared_len: usize, body: &[u8]) -> SocketAddr {
    serve_once(
        format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: {declared_len}\r\nConnection: close"
        ),
        body.to_vec(),
    )
}

/// Sends `body` as a single chunk with chunked transfer encoding (no Content-Length).
#[must_use]
pub fn serve_chunked_body(body: &[u8]) -> SocketAddr {
    let mut encoded = format!("{:x}\r\n", body.len()).into_bytes();
    encoded.extend_from_slice(body);
    encoded.extend_from_slice(b"\r\n0\r\n\r\n");
    serve_once(
        "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nTransfer-Encoding: chunked\r\nConnection: close"
            .to_string(),
        encoded,
    )
}

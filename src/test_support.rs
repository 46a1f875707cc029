//! Local HTTP fixtures for transfer and batch tests: a bare TCP accept
//! loop serving one canned response per connection, so the streaming path
//! is exercised without touching the network.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub struct HttpFixture {
    status_line: &'static str,
    body: Vec<u8>,
    declared_len: u64,
    stall: bool,
}

impl HttpFixture {
    pub fn ok(body: &[u8]) -> Self {
        Self {
            status_line: "200 OK",
            body: body.to_vec(),
            declared_len: body.len() as u64,
            stall: false,
        }
    }

    pub fn not_found() -> Self {
        Self {
            status_line: "404 Not Found",
            body: b"not found".to_vec(),
            declared_len: 9,
            stall: false,
        }
    }

    /// Declares more bytes than it sends, so the client sees the stream
    /// break partway through.
    pub fn truncated(body: &[u8], declared_len: u64) -> Self {
        Self {
            status_line: "200 OK",
            body: body.to_vec(),
            declared_len,
            stall: false,
        }
    }

    /// Sends headers, then never delivers the body.
    pub fn stalled() -> Self {
        Self {
            status_line: "200 OK",
            body: Vec::new(),
            declared_len: 1024,
            stall: true,
        }
    }
}

/// Bind an ephemeral port, serve the fixture to every connection, and
/// return the base URL.
pub async fn serve_fixture(fixture: HttpFixture) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };

            // Drain the request head before responding.
            let mut buf = [0u8; 2048];
            let _ = socket.read(&mut buf).await;

            let head = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                fixture.status_line, fixture.declared_len
            );
            if socket.write_all(head.as_bytes()).await.is_err() {
                continue;
            }
            if fixture.stall {
                tokio::time::sleep(Duration::from_secs(60)).await;
                continue;
            }
            let _ = socket.write_all(&fixture.body).await;
            let _ = socket.shutdown().await;
        }
    });

    format!("http://{addr}")
}

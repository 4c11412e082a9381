//! A raw HTTP server whose first responses break off partway through the body.
//!
//! wiremock always writes whole bodies, so interrupted transfers are served
//! straight from a tokio listener.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use super::socket_guard::should_skip_socket_bound_test;

/// How a faulty response ends after its partial body.
#[derive(Debug, Clone, Copy)]
pub enum Interruption {
    /// Keep the connection open and send nothing more.
    Stall,
    /// Close the connection short of `Content-Length`.
    Truncate,
}

/// Handle to a running server.
pub struct FlakyBodyServer {
    base: String,
    connections: Arc<AtomicUsize>,
}

impl FlakyBodyServer {
    /// Serves `body` at every path. The first `faulty` connections get the
    /// full headers and a third of the body, then `interruption`; later
    /// connections get the whole body.
    #[track_caller]
    pub fn start_or_skip(
        body: &'static [u8],
        faulty: usize,
        interruption: Interruption,
    ) -> impl std::future::Future<Output = Option<Self>> {
        let skip = should_skip_socket_bound_test();
        async move {
            if skip {
                return None;
            }
            let listener = TcpListener::bind("127.0.0.1:0").await.ok()?;
            let base = format!("http://{}", listener.local_addr().ok()?);
            let connections = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&connections);
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let seen = counter.fetch_add(1, Ordering::SeqCst);
                    let fault = (seen < faulty).then_some(interruption);
                    tokio::spawn(respond(stream, body, fault));
                }
            });
            Some(Self { base, connections })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

async fn respond(mut stream: TcpStream, body: &'static [u8], fault: Option<Interruption>) {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }

    let head = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    if stream.write_all(head.as_bytes()).await.is_err() {
        return;
    }

    match fault {
        None => {
            let _ = stream.write_all(body).await;
            let _ = stream.shutdown().await;
        }
        Some(interruption) => {
            let _ = stream.write_all(&body[..body.len() / 3]).await;
            let _ = stream.flush().await;
            match interruption {
                Interruption::Stall => tokio::time::sleep(Duration::from_secs(30)).await,
                Interruption::Truncate => {
                    let _ = stream.shutdown().await;
                }
            }
        }
    }
}

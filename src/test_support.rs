//! Shared helpers for unit tests.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serves one response that promises a longer body than it sends, then hangs up.
///
/// Returns the base URL of the listener.
pub(crate) async fn truncated_body_server(partial_body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 8192];
        let _ = socket.read(&mut buf).await;
        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n",
            partial_body.len() + 200
        );
        let _ = socket.write_all(head.as_bytes()).await;
        let _ = socket.write_all(partial_body.as_bytes()).await;
        let _ = socket.shutdown().await;
    });

    format!("http://{addr}")
}

//! A canned in-process scorer for exercising the pool over real HTTP.
//!
//! The first digit of the requested order number steers the response: `1` answers INVALID, `4` answers
//! 429 with `Retry-After: 7`, `5` answers a plain 500, and anything else answers PROCESSED with an accrual
//! of 729.98.

use std::net::SocketAddr;

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    task::JoinHandle,
};

pub(crate) async fn spawn_stub_scorer() -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("could not bind stub scorer");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let mut read = 0;
                loop {
                    match socket.read(&mut buf[read..]).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => read += n,
                    }
                    if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") || read == buf.len() {
                        break;
                    }
                }
                let request = String::from_utf8_lossy(&buf[..read]).into_owned();
                let path = request.split_whitespace().nth(1).unwrap_or("/");
                let number = path.rsplit('/').next().unwrap_or("");
                let response = respond_for(number);
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    (addr, handle)
}

fn respond_for(number: &str) -> String {
    match number.chars().next() {
        Some('1') => json_response(&format!(r#"{{"order":"{number}","status":"INVALID"}}"#)),
        Some('4') => "HTTP/1.1 429 Too Many Requests\r\nRetry-After: 7\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            .to_string(),
        Some('5') => "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string(),
        _ => json_response(&format!(r#"{{"order":"{number}","status":"PROCESSED","accrual":729.98}}"#)),
    }
}

fn json_response(body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

//! Shared utilities for integration and load testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use split_fanout::{FanoutConfig, HttpServer, Shutdown};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// A fan-out server running in the background.
#[allow(dead_code)]
pub struct RunningServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub config_tx: mpsc::UnboundedSender<FanoutConfig>,
}

impl RunningServer {
    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }
}

/// Config pointing at a mock downstream, with short test-friendly timeouts.
pub fn config_for(downstream: SocketAddr) -> FanoutConfig {
    let mut config = FanoutConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.downstream.url = format!("http://{}/count", downstream);
    config.timeouts.connect_ms = 500;
    config.timeouts.call_ms = 2_000;
    config.timeouts.request_secs = 10;
    config
}

/// Start the fan-out server on an ephemeral port.
pub async fn start_fanout(config: FanoutConfig) -> RunningServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (config_tx, config_updates) = mpsc::unbounded_channel();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    RunningServer {
        addr,
        shutdown,
        config_tx,
    }
}

/// Start a mock downstream whose reply is computed from the request body.
pub async fn start_programmable_downstream<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let _ = serve_one(socket, f).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a mock downstream that always answers 200 with `response`.
#[allow(dead_code)]
pub async fn start_mock_downstream(response: &'static str) -> SocketAddr {
    start_programmable_downstream(move |_| async move { (200, response.to_string()) }).await
}

/// An address with nothing listening on it.
#[allow(dead_code)]
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

async fn serve_one<F, Fut>(socket: TcpStream, f: Arc<F>) -> std::io::Result<()>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = (u16, String)>,
{
    let mut reader = BufReader::new(socket);
    let body = read_request_body(&mut reader).await?;
    let (status, reply) = f(body).await;

    let status_text = match status {
        200 => "200 OK",
        404 => "404 Not Found",
        429 => "429 Too Many Requests",
        500 => "500 Internal Server Error",
        502 => "502 Bad Gateway",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_text,
        reply.len(),
        reply
    );

    let mut socket = reader.into_inner();
    socket.write_all(response.as_bytes()).await?;
    socket.shutdown().await
}

async fn read_request_body(reader: &mut BufReader<TcpStream>) -> std::io::Result<String> {
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            return Err(std::io::ErrorKind::UnexpectedEof.into());
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }

    let mut body = vec![0; content_length];
    reader.read_exact(&mut body).await?;
    Ok(String::from_utf8_lossy(&body).into_owned())
}

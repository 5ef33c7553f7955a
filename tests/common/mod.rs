//! Shared utilities for integration tests.

use std::io::{self, Write};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use cloud_logging::logging::{cloud, CloudLoggingHandler, Level, Logger};
use tokio::net::TcpListener;

/// In-memory stand-in for stderr.
#[derive(Clone, Default)]
pub struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw output split into lines.
    #[allow(dead_code)]
    pub fn raw_lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Every line parsed as JSON. Panics on a partial or invalid line.
    pub fn records(&self) -> Vec<serde_json::Value> {
        self.raw_lines()
            .iter()
            .map(|line| serde_json::from_str(line).expect("complete JSON line"))
            .collect()
    }

    /// A logger writing Cloud Logging JSON into this capture.
    pub fn logger(&self) -> Logger {
        let handler = CloudLoggingHandler::new(self.clone(), cloud::options(Level::DEBUG));
        Logger::new(Arc::new(handler))
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Serve `router` on an ephemeral local port.
#[allow(dead_code)]
pub async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

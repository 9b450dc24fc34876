//! Mock bank list server for testing
//!
//! A tiny HTTP server on a random local port that answers
//! `GET /api/banks/v1` with a configurable payload or status, and counts the
//! requests it receives.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde_json::{json, Value as JsonValue};

/// Path served by the mock
pub const BANKS_PATH: &str = "/api/banks/v1";

/// Mock bank list server
pub struct MockBankServer {
    port: u16,
    running: Arc<AtomicBool>,
    requests: Arc<AtomicUsize>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

/// Response configuration
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// HTTP status for the banks path
    pub status: u16,
    /// Records returned on success
    pub payload: Vec<JsonValue>,
    /// Overrides the serialized payload when set
    pub raw_body: Option<String>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            status: 200,
            payload: sample_banks(),
            raw_body: None,
        }
    }
}

/// A small slice of the real bank list, including one entry without a code
pub fn sample_banks() -> Vec<JsonValue> {
    vec![
        json!({"ispb": "00000000", "name": "BCO DO BRASIL S.A.", "code": 1, "fullName": "Banco do Brasil S.A."}),
        json!({"ispb": "00000208", "name": "BRB - BCO DE BRASILIA S.A.", "code": 70, "fullName": "BRB - BANCO DE BRASILIA S.A."}),
        json!({"ispb": "00038121", "name": "Selic", "code": null, "fullName": "Banco Central do Brasil - Selic"}),
        json!({"ispb": "00360305", "name": "CAIXA ECONOMICA FEDERAL", "code": 104, "fullName": "CAIXA ECONOMICA FEDERAL"}),
    ]
}

impl MockBankServer {
    /// Start a new mock server on a random available port
    pub fn start(config: MockConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let requests = Arc::new(AtomicUsize::new(0));

        // Non-blocking accept so stop() can end the loop
        listener.set_nonblocking(true)?;

        let running_clone = running.clone();
        let requests_clone = requests.clone();
        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        requests_clone.fetch_add(1, Ordering::SeqCst);
                        let cfg = config.clone();
                        thread::spawn(move || handle_connection(stream, &cfg));
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(Duration::from_millis(10));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            running,
            requests,
            thread_handle: Some(thread_handle),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Full URL of the bank list endpoint
    pub fn banks_url(&self) -> String {
        format!("{}{}", self.base_url(), BANKS_PATH)
    }

    /// Number of connections accepted so far
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockBankServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn handle_connection(mut stream: TcpStream, config: &MockConfig) {
    let _ = stream.set_nonblocking(false);
    let mut buffer = [0; 4096];

    let Ok(n) = stream.read(&mut buffer) else {
        return;
    };
    let request = String::from_utf8_lossy(&buffer[..n]);

    let first_line = request.lines().next().unwrap_or("");
    let parts: Vec<&str> = first_line.split_whitespace().collect();
    if parts.len() < 2 {
        send_response(&mut stream, 400, r#"{"message": "Invalid request"}"#);
        return;
    }

    let (method, path) = (parts[0], parts[1]);
    let path = path.split('?').next().unwrap_or(path);

    if method != "GET" {
        send_response(&mut stream, 405, r#"{"message": "Method not allowed"}"#);
        return;
    }
    if path != BANKS_PATH {
        send_response(&mut stream, 404, r#"{"message": "Not found"}"#);
        return;
    }
    if config.status != 200 {
        send_response(&mut stream, config.status, r#"{"message": "Server error"}"#);
        return;
    }

    let body = match &config.raw_body {
        Some(raw) => raw.clone(),
        None => JsonValue::Array(config.payload.clone()).to_string(),
    };
    send_response(&mut stream, 200, &body);
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

fn send_response(stream: &mut TcpStream, status: u16, body: &str) {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text(status),
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_server_starts() {
        let server = MockBankServer::start(MockConfig::default()).unwrap();
        assert!(server.banks_url().ends_with(BANKS_PATH));
        assert_eq!(server.request_count(), 0);
    }

    #[test]
    fn test_sample_banks_has_null_code() {
        let banks = sample_banks();
        assert_eq!(banks.iter().filter(|b| b["code"].is_null()).count(), 1);
    }
}

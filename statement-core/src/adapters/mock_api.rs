//! Mock statement API server for testing
//!
//! Serves the four statement endpoints over plain HTTP on a random local
//! port, in the loosely-typed shapes the real backend produces:
//! - GET /api/ClientStatement/statement returns `{ data: { clientName, ... } }`
//! - GET /api/ClientStatement/transactions returns `{ items: [ { EDate, Debit, Credit, ... } ] }`
//! - the `SupplierStatement` pair returns bare objects/arrays with camelCase keys

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use serde_json::json;

/// Mock API server for testing
pub struct MockStatementServer {
    port: u16,
    running: Arc<AtomicBool>,
    requests: Arc<AtomicUsize>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

/// Failure and latency knobs
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Answer every request with this status and JSON message
    pub fail_with: Option<(u16, String)>,
    /// Wrap payloads in `{ success: false, message }` with a 200 status
    pub soft_failure: Option<String>,
    /// Read the request, then close the socket without answering
    pub drop_connection: bool,
    /// Delay in milliseconds before responding
    pub delay_ms: u64,
    /// Redirect every request back to itself
    pub redirect_loop: bool,
}

impl MockStatementServer {
    /// Start a new mock server on a random available port
    pub fn start(config: MockConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let requests = Arc::new(AtomicUsize::new(0));

        // Non-blocking so the accept loop notices shutdown
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
                        thread::sleep(std::time::Duration::from_millis(10));
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

    /// Base URL including the `/api/` prefix
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}/api/", self.port)
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

impl Drop for MockStatementServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn handle_connection(mut stream: TcpStream, config: &MockConfig) {
    // Accepted sockets inherit non-blocking mode on some platforms
    let _ = stream.set_nonblocking(false);

    let mut buffer = [0; 4096];
    let n = match stream.read(&mut buffer) {
        Ok(n) => n,
        Err(_) => return,
    };
    let request = String::from_utf8_lossy(&buffer[..n]);

    if config.delay_ms > 0 {
        thread::sleep(std::time::Duration::from_millis(config.delay_ms));
    }

    if config.drop_connection {
        let _ = stream.shutdown(std::net::Shutdown::Both);
        return;
    }

    if config.redirect_loop {
        let target = request.lines().next().and_then(|l| l.split_whitespace().nth(1)).unwrap_or("/");
        let response = format!(
            "HTTP/1.1 302 Found\r\nLocation: {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            target
        );
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.flush();
        return;
    }

    if let Some((status, message)) = &config.fail_with {
        let body = json!({ "message": message }).to_string();
        send_response(&mut stream, *status, &body);
        return;
    }

    let first_line = request.lines().next().unwrap_or("");
    let parts: Vec<&str> = first_line.split_whitespace().collect();
    if parts.len() < 2 || parts[0] != "GET" {
        send_response(&mut stream, 405, r#"{"message":"Method not allowed"}"#);
        return;
    }

    let (path, query) = parts[1].split_once('?').unwrap_or((parts[1], ""));
    let has_key = query.split('&').any(|p| p.starts_with("key=") && p.len() > 4);
    let has_hash = query.split('&').any(|p| p.starts_with("hash=") && p.len() > 5);
    if !has_key || !has_hash {
        send_response(&mut stream, 400, r#"{"Message":"Missing key or hash"}"#);
        return;
    }

    let payload = match path {
        "/api/ClientStatement/statement" => json!({
            "data": {
                "clientName": "Mock Client",
                "phone": "+20 100 000 0000",
                "accountNumber": "EG000111222",
                "Balance": "3,799.50",
                "Currency": "EGP"
            }
        }),
        "/api/ClientStatement/transactions" => json!({
            "items": [
                { "EDate": "05/12/2024", "Description": "Purchase", "Debit": 1200.5, "Credit": 0 },
                { "EDate": "01/12/2024", "Description": "Deposit", "Debit": 0, "Credit": 5000 }
            ]
        }),
        "/api/SupplierStatement/statement" => json!({
            "supplierName": "Mock Supplier",
            "vatNumber": "EG-VAT-000"
        }),
        "/api/SupplierStatement/transactions" => json!([
            { "date": "2024-12-02", "type": "Invoice", "amount": 2500, "reference": "INV-1" },
            { "date": "2024-12-06", "type": "Payment", "amount": -1000 }
        ]),
        _ => {
            send_response(&mut stream, 404, r#"{"message":"Endpoint not found"}"#);
            return;
        }
    };

    let body = match &config.soft_failure {
        Some(message) => json!({ "success": false, "message": message, "data": null }),
        None => payload,
    };
    send_response(&mut stream, 200, &body.to_string());
}

fn send_response(stream: &mut TcpStream, status: u16, body: &str) {
    let status_text = match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "Error",
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::http::HttpTransport;
    use crate::domain::result::Error;
    use crate::domain::{AccountRole, CompositeKey};
    use crate::ports::StatementTransport;
    use crate::services::normalize::{normalize_entries, normalize_profile};
    use rust_decimal::Decimal;

    fn key() -> CompositeKey {
        CompositeKey::new("K1", "H1").unwrap()
    }

    #[tokio::test]
    async fn test_client_statement_round_trip() {
        let server = MockStatementServer::start(MockConfig::default()).unwrap();
        let transport = HttpTransport::new(&server.base_url()).unwrap();

        let header = transport.fetch_statement(&key(), AccountRole::Client).await.unwrap();
        let profile = normalize_profile(&header).unwrap();
        assert_eq!(profile.name, "Mock Client");
        assert_eq!(profile.balance, Some(Decimal::new(379950, 2)));

        let raw = transport.fetch_transactions(&key(), AccountRole::Client).await.unwrap();
        let entries = normalize_entries(&raw).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].credit, Decimal::new(5000, 0));
    }

    #[tokio::test]
    async fn test_supplier_signed_amounts() {
        let server = MockStatementServer::start(MockConfig::default()).unwrap();
        let transport = HttpTransport::new(&server.base_url()).unwrap();

        let raw = transport.fetch_transactions(&key(), AccountRole::Supplier).await.unwrap();
        let entries = normalize_entries(&raw).unwrap();
        assert_eq!(entries[0].credit, Decimal::new(2500, 0));
        assert_eq!(entries[1].debit, Decimal::new(1000, 0));
        assert_eq!(entries[1].credit, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_server_error_carries_message() {
        let server = MockStatementServer::start(MockConfig {
            fail_with: Some((404, "Statement not found".to_string())),
            ..Default::default()
        })
        .unwrap();
        let transport = HttpTransport::new(&server.base_url()).unwrap();

        let err = transport.fetch_statement(&key(), AccountRole::Client).await.unwrap_err();
        match err {
            Error::Server { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Statement not found");
            }
            other => panic!("expected server error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_soft_failure_envelope() {
        let server = MockStatementServer::start(MockConfig {
            soft_failure: Some("Link expired".to_string()),
            ..Default::default()
        })
        .unwrap();
        let transport = HttpTransport::new(&server.base_url()).unwrap();

        let raw = transport.fetch_statement(&key(), AccountRole::Client).await.unwrap();
        let err = normalize_profile(&raw).unwrap_err();
        assert!(!err.is_transient());
        assert_eq!(err.user_message().as_deref(), Some("Link expired"));
    }

    #[tokio::test]
    async fn test_dropped_connection_is_transport_abort() {
        let server = MockStatementServer::start(MockConfig {
            drop_connection: true,
            ..Default::default()
        })
        .unwrap();
        let transport = HttpTransport::new(&server.base_url()).unwrap();

        let err = transport.fetch_transactions(&key(), AccountRole::Client).await.unwrap_err();
        assert!(err.is_transient(), "got {:?}", err);
        assert!(server.request_count() >= 1);
    }

    #[tokio::test]
    async fn test_redirect_loop_is_not_transient() {
        let server = MockStatementServer::start(MockConfig {
            redirect_loop: true,
            ..Default::default()
        })
        .unwrap();
        let transport = HttpTransport::new(&server.base_url()).unwrap();

        let err = transport.fetch_statement(&key(), AccountRole::Client).await.unwrap_err();
        assert!(!err.is_transient(), "got {:?}", err);
        assert!(matches!(err, Error::Server { .. }));
        assert_eq!(err.user_message().as_deref(), Some("Failed to load statement"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_abort() {
        // Bind and release a port so nothing is listening on it
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let transport = HttpTransport::new(&format!("http://127.0.0.1:{}/api/", port)).unwrap();

        let err = transport.fetch_statement(&key(), AccountRole::Client).await.unwrap_err();
        assert!(err.is_transient());
    }
}

//! HTTP API Server
//!
//! Lightweight HTTP/1.1 server for the mock Djobea API. One thread per
//! connection, no web framework.
//!
//! ```bash
//! djobea serve --port 8080
//! djobea serve --bind 0.0.0.0 --no-latency --fixtures
//! ```

use crate::api::handlers::*;
use crate::api::models::*;
use crate::api::source::MockDataSource;
use crate::error::{DjobeaError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Bind address
    pub bind: String,
    /// Port
    pub port: u16,
    /// Enable CORS for all origins
    pub cors_enabled: bool,
    /// Sleep the per-endpoint latency
    pub simulate_latency: bool,
    /// Maximum request body size (bytes)
    pub max_body_size: usize,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8080,
            cors_enabled: true,
            simulate_latency: true,
            max_body_size: 1024 * 1024, // 1 MB
        }
    }
}

impl ApiServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// A fully rendered response, before it hits the socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Success envelope around `data`
    pub fn ok<T: Serialize>(data: T) -> Self {
        Self::json(200, &Envelope::ok(data))
    }

    /// Failure envelope with `message`
    pub fn failure(status: u16, message: impl Into<String>) -> Self {
        Self::json(status, &Envelope::<()>::failure(message))
    }

    fn json<T: Serialize>(status: u16, body: &T) -> Self {
        match serde_json::to_vec(body) {
            Ok(body) => Self {
                status,
                content_type: "application/json".to_string(),
                body,
            },
            Err(e) => {
                error!("Failed to serialize response: {}", e);
                Self {
                    status: 500,
                    content_type: "application/json".to_string(),
                    body: br#"{"success":false,"error":"serialization failed"}"#.to_vec(),
                }
            }
        }
    }

    fn from_result<T: Serialize>(result: ApiResult<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::failure(500, e.to_string()),
        }
    }

    fn pdf(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type: "application/pdf".to_string(),
            body,
        }
    }

    fn no_content() -> Self {
        Self {
            status: 204,
            content_type: "text/plain".to_string(),
            body: Vec::new(),
        }
    }
}

/// Known endpoints, resolved from the path alone
#[derive(Debug, Clone, PartialEq, Eq)]
enum Route<'a> {
    Health,
    DashboardStats,
    Analytics,
    Providers,
    Requests,
    RequestStatus(&'a str),
    RequestAssign(&'a str),
    RequestCancel(&'a str),
    RequestInvoice(&'a str),
}

impl<'a> Route<'a> {
    fn resolve(path: &'a str) -> Option<Self> {
        let segments: Vec<&str> = path.trim_end_matches('/').split('/').skip(1).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return None;
        }
        let route = match segments[..] {
            ["api", "health"] => Self::Health,
            ["api", "dashboard", "stats"] => Self::DashboardStats,
            ["api", "analytics"] => Self::Analytics,
            ["api", "providers"] => Self::Providers,
            ["api", "requests"] => Self::Requests,
            ["api", "requests", id, "status"] => Self::RequestStatus(id),
            ["api", "requests", id, "assign"] => Self::RequestAssign(id),
            ["api", "requests", id, "cancel"] => Self::RequestCancel(id),
            ["api", "requests", id, "invoice"] => Self::RequestInvoice(id),
            _ => return None,
        };
        Some(route)
    }

    fn methods(&self) -> &'static [&'static str] {
        match self {
            Self::Providers => &["GET", "POST"],
            Self::RequestStatus(_) | Self::RequestAssign(_) | Self::RequestCancel(_) => &["POST"],
            _ => &["GET"],
        }
    }
}

/// API HTTP Server
pub struct ApiServer {
    /// Configuration
    config: ApiServerConfig,
    /// Shared application state
    state: Arc<AppState>,
    /// Shutdown flag
    shutdown: Arc<AtomicBool>,
}

impl ApiServer {
    /// Create a new API server over `source`
    pub fn new(config: ApiServerConfig, source: Arc<dyn MockDataSource>) -> Self {
        let state = Arc::new(AppState::new(source, config.simulate_latency));
        Self {
            config,
            state,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get shutdown flag for external control
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Get shared state
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Bind the configured address and serve until shutdown (blocking)
    pub fn run(&self) -> Result<()> {
        let addr = self.config.addr();
        let listener = TcpListener::bind(&addr).map_err(|e| DjobeaError::connection(&addr, e.to_string()))?;
        self.serve(listener)
    }

    /// Serve connections from an already bound listener (blocking)
    pub fn serve(&self, listener: TcpListener) -> Result<()> {
        let addr = listener
            .local_addr()
            .map_err(|e| DjobeaError::connection(&self.config.addr(), e.to_string()))?;
        listener
            .set_nonblocking(true)
            .map_err(|e| DjobeaError::connection(addr.to_string(), e.to_string()))?;

        info!("Djobea mock API listening on http://{}", addr);

        while !self.shutdown.load(Ordering::SeqCst) {
            match listener.accept() {
                Ok((stream, peer)) => {
                    let state = Arc::clone(&self.state);
                    let config = self.config.clone();

                    thread::spawn(move || {
                        if let Err(e) = handle_connection(stream, peer, &state, &config) {
                            if e.is_recoverable() {
                                debug!("Connection from {} dropped: {}", peer, e);
                            } else {
                                warn!("Connection error from {}: {}", peer, e);
                            }
                        }
                    });
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(10));
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }

        info!("API server shutting down");
        Ok(())
    }
}

/// Handle a single HTTP connection
fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    state: &AppState,
    config: &ApiServerConfig,
) -> Result<()> {
    stream.set_nonblocking(false)?;
    let mut reader = BufReader::new(stream.try_clone()?);

    // Read request line
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;

    let (method, target) = match parse_request_line(&request_line) {
        Ok(parts) => parts,
        Err(e) => {
            write_response(&mut stream, &HttpResponse::failure(400, e.to_string()), config)?;
            return Err(e);
        }
    };

    // Read headers
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            if key.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }

    if content_length > config.max_body_size {
        let response = HttpResponse::failure(413, "Request body too large");
        return write_response(&mut stream, &response, config);
    }

    // Read body if present
    let body = if content_length > 0 {
        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body)?;
        Some(String::from_utf8_lossy(&body).into_owned())
    } else {
        None
    };

    debug!("{} {} from {}", method, target, peer);
    let response = route_request(method, target, body.as_deref(), state);
    info!("{} {} -> {}", method, target, response.status);

    write_response(&mut stream, &response, config)
}

/// Split `GET /path HTTP/1.1` into method and target
fn parse_request_line(line: &str) -> Result<(&str, &str)> {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(method), Some(target)) if target.starts_with('/') => Ok((method, target)),
        _ => Err(DjobeaError::BadRequest(format!("malformed request line '{}'", line.trim()))),
    }
}

/// Route an HTTP request to the matching handler
pub fn route_request(method: &str, target: &str, body: Option<&str>, state: &AppState) -> HttpResponse {
    // Parse path and query string
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    let query_params = parse_query_string(query);

    // Handle CORS preflight
    if method == "OPTIONS" {
        return HttpResponse::no_content();
    }

    let Some(route) = Route::resolve(path) else {
        return HttpResponse::failure(404, format!("No route for {}", path));
    };
    if !route.methods().iter().any(|m| *m == method) {
        return HttpResponse::failure(405, format!("Method {} not allowed on {}", method, path));
    }

    match (method, route) {
        (_, Route::Health) => HttpResponse::ok(handle_health(state)),

        (_, Route::DashboardStats) => HttpResponse::ok(handle_dashboard_stats(state)),

        (_, Route::Analytics) => {
            let period = query_params.get("period").map(String::as_str);
            HttpResponse::from_result(handle_analytics(state, period))
        }

        ("GET", Route::Providers) => {
            let params = pagination(&query_params);
            HttpResponse::ok(handle_list_providers(state, &params))
        }

        (_, Route::Providers) => HttpResponse::from_result(handle_create_provider(state, body)),

        (_, Route::Requests) => {
            let params = pagination(&query_params);
            let status = query_params.get("status").map(String::as_str).filter(|s| !s.is_empty());
            HttpResponse::from_result(handle_list_requests(state, &params, status))
        }

        (_, Route::RequestStatus(id)) => HttpResponse::from_result(handle_update_status(state, id, body)),

        (_, Route::RequestAssign(id)) => HttpResponse::from_result(handle_assign(state, id, body)),

        (_, Route::RequestCancel(id)) => HttpResponse::from_result(handle_cancel(state, id, body)),

        (_, Route::RequestInvoice(id)) => match handle_invoice(state, id) {
            Ok(pdf) => HttpResponse::pdf(pdf),
            Err(e) => HttpResponse::failure(500, e.to_string()),
        },
    }
}

fn pagination(query_params: &HashMap<String, String>) -> PaginationParams {
    let defaults = PaginationParams::default();
    PaginationParams {
        page: query_params.get("page").and_then(|s| s.parse().ok()).unwrap_or(defaults.page),
        per_page: query_params
            .get("per_page")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.per_page),
    }
}

/// Parse query string into key-value pairs
fn parse_query_string(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next()?;
            let value = parts.next().unwrap_or("");
            Some((urlencoding_decode(key), urlencoding_decode(value)))
        })
        .collect()
}

/// Simple URL decoding
fn urlencoding_decode(s: &str) -> String {
    let mut bytes = Vec::with_capacity(s.len());
    let mut iter = s.bytes();

    while let Some(b) = iter.next() {
        match b {
            b'%' => {
                let hex: Vec<u8> = iter.by_ref().take(2).collect();
                let decoded = std::str::from_utf8(&hex)
                    .ok()
                    .and_then(|h| u8::from_str_radix(h, 16).ok());
                if let Some(byte) = decoded {
                    bytes.push(byte);
                }
            }
            b'+' => bytes.push(b' '),
            other => bytes.push(other),
        }
    }

    String::from_utf8_lossy(&bytes).into_owned()
}

/// Write an HTTP response
fn write_response(stream: &mut TcpStream, response: &HttpResponse, config: &ApiServerConfig) -> Result<()> {
    let status_text = match response.status {
        200 => "OK",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        _ => "Unknown",
    };

    let mut head = format!(
        "HTTP/1.1 {} {}\r\n\
         Content-Type: {}\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n",
        response.status,
        status_text,
        response.content_type,
        response.body.len(),
    );

    if config.cors_enabled {
        head.push_str("Access-Control-Allow-Origin: *\r\n");
        head.push_str("Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n");
        head.push_str("Access-Control-Allow-Headers: Content-Type, Authorization\r\n");
        if response.status == 204 {
            head.push_str("Access-Control-Max-Age: 86400\r\n");
        }
    }

    head.push_str("\r\n");

    stream.write_all(head.as_bytes())?;
    stream.write_all(&response.body)?;
    stream.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::source::FixtureSource;
    use serde_json::Value;
    use std::time::Instant;

    fn fixture_state(simulate_latency: bool) -> AppState {
        AppState::new(Arc::new(FixtureSource::new()), simulate_latency)
    }

    fn json(response: &HttpResponse) -> Value {
        serde_json::from_slice(&response.body).unwrap()
    }

    #[test]
    fn test_parse_query_string() {
        let params = parse_query_string("page=1&per_page=20&search=hello+world");
        assert_eq!(params.get("page"), Some(&"1".to_string()));
        assert_eq!(params.get("per_page"), Some(&"20".to_string()));
        assert_eq!(params.get("search"), Some(&"hello world".to_string()));
        assert!(parse_query_string("").is_empty());
    }

    #[test]
    fn test_url_decode() {
        assert_eq!(urlencoding_decode("hello%20world"), "hello world");
        assert_eq!(urlencoding_decode("foo+bar"), "foo bar");
        assert_eq!(urlencoding_decode("test%2Fpath"), "test/path");
        assert_eq!(urlencoding_decode("Bonamoussadi%C3%A9"), "Bonamoussadié");
    }

    #[test]
    fn test_update_status_after_latency() {
        let state = fixture_state(true);
        let started = Instant::now();
        let response = route_request("POST", "/api/requests/123/status", Some(r#"{"status":"completed"}"#), &state);

        assert!(started.elapsed() >= Duration::from_millis(1000));
        assert_eq!(response.status, 200);
        let body = json(&response);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["id"], "123");
        assert_eq!(body["data"]["status"], "completed");
        let stamp = body["data"]["updatedAt"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[test]
    fn test_simulated_failure_is_500_envelope() {
        let state = AppState::new(Arc::new(FixtureSource::new().failing(Operation::Cancel)), false);
        let response = route_request("POST", "/api/requests/9/cancel", None, &state);
        assert_eq!(response.status, 500);
        let body = json(&response);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("cancellation"));
        assert!(body.get("data").is_none());
    }

    #[test]
    fn test_validation_failure_is_500_envelope() {
        let state = fixture_state(false);
        let response = route_request("POST", "/api/requests/9/status", Some("{not json"), &state);
        assert_eq!(response.status, 500);
        assert_eq!(json(&response)["success"], false);
    }

    #[test]
    fn test_unknown_route_and_wrong_method() {
        let state = fixture_state(false);
        assert_eq!(route_request("GET", "/api/jobs", None, &state).status, 404);
        assert_eq!(route_request("GET", "/api/requests/1/status", None, &state).status, 405);
        assert_eq!(route_request("DELETE", "/api/providers", None, &state).status, 405);
        assert_eq!(route_request("OPTIONS", "/api/providers", None, &state).status, 204);
    }

    #[test]
    fn test_parse_request_line() {
        assert_eq!(parse_request_line("GET /api/health HTTP/1.1\r\n").unwrap(), ("GET", "/api/health"));
        for line in ["", "GET\r\n", "GET api/health HTTP/1.1"] {
            let err = parse_request_line(line).unwrap_err();
            assert!(matches!(err, DjobeaError::BadRequest(_)));
            assert!(!err.is_recoverable());
        }
    }

    #[test]
    fn test_malformed_request_gets_400() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let config = ApiServerConfig {
            simulate_latency: false,
            ..Default::default()
        };
        let server = ApiServer::new(config, Arc::new(FixtureSource::new()));
        let shutdown = server.shutdown_flag();
        let handle = thread::spawn(move || server.serve(listener));

        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(b"HELLO\r\n").unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).unwrap();

        assert!(raw.starts_with("HTTP/1.1 400 Bad Request"));
        assert!(raw.contains("malformed request line"));

        shutdown.store(true, Ordering::SeqCst);
        handle.join().unwrap().unwrap();
    }

    #[test]
    fn test_empty_request_id_is_not_a_route() {
        let state = fixture_state(false);
        let body = Some(r#"{"status":"completed"}"#);
        assert_eq!(route_request("POST", "/api/requests//status", body, &state).status, 404);
        assert_eq!(route_request("GET", "/api/requests//invoice", None, &state).status, 404);
        assert_eq!(route_request("GET", "/api//health", None, &state).status, 404);
    }

    #[test]
    fn test_huge_page_returns_empty_page() {
        let state = fixture_state(false);
        for path in ["/api/providers", "/api/requests"] {
            let target = format!("{}?page={}&per_page=2", path, usize::MAX);
            let response = route_request("GET", &target, None, &state);
            assert_eq!(response.status, 200);
            let body = json(&response);
            assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(0));
        }
    }

    #[test]
    fn test_list_endpoints() {
        let state = fixture_state(false);

        let response = route_request("GET", "/api/requests?status=completed&per_page=5", None, &state);
        let body = json(&response);
        assert_eq!(body["data"]["total"], 1);
        assert_eq!(body["data"]["items"][0]["id"], "124");

        let response = route_request("GET", "/api/providers?page=2&per_page=1", None, &state);
        let body = json(&response);
        assert_eq!(body["data"]["items"][0]["id"], "p-2");
        assert_eq!(body["data"]["totalPages"], 2);

        let response = route_request("GET", "/api/dashboard/stats/", None, &state);
        assert_eq!(json(&response)["data"]["totalRequests"], 1247);
    }

    #[test]
    fn test_invoice_content_type() {
        let state = fixture_state(false);
        let response = route_request("GET", "/api/requests/123/invoice", None, &state);
        assert_eq!(response.status, 200);
        assert_eq!(response.content_type, "application/pdf");
        assert!(response.body.starts_with(b"%PDF"));
    }

    #[test]
    fn test_serves_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let config = ApiServerConfig {
            simulate_latency: false,
            ..Default::default()
        };
        let server = ApiServer::new(config, Arc::new(FixtureSource::new()));
        let shutdown = server.shutdown_flag();
        let handle = thread::spawn(move || server.serve(listener));

        let mut stream = TcpStream::connect(addr).unwrap();
        stream
            .write_all(b"GET /api/health HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).unwrap();

        assert!(raw.starts_with("HTTP/1.1 200 OK"));
        assert!(raw.contains("Access-Control-Allow-Origin: *"));
        assert!(raw.contains(r#""status":"ok""#));

        shutdown.store(true, Ordering::SeqCst);
        handle.join().unwrap().unwrap();
    }

    #[test]
    fn test_oversized_body_rejected() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let config = ApiServerConfig {
            simulate_latency: false,
            max_body_size: 16,
            ..Default::default()
        };
        let server = ApiServer::new(config, Arc::new(FixtureSource::new()));
        let shutdown = server.shutdown_flag();
        let handle = thread::spawn(move || server.serve(listener));

        let mut stream = TcpStream::connect(addr).unwrap();
        stream
            .write_all(b"POST /api/providers HTTP/1.1\r\nContent-Length: 1000\r\n\r\n")
            .unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).unwrap();

        assert!(raw.starts_with("HTTP/1.1 413 Payload Too Large"));
        assert!(raw.contains(r#""success":false"#));

        shutdown.store(true, Ordering::SeqCst);
        handle.join().unwrap().unwrap();
    }
}

//! HTTP surface for the council
//!
//! A small tiny_http server. Requests are handed to a fixed pool of worker
//! threads through a bounded queue; each worker drives the async council on
//! the shared tokio runtime. The pool always has one more worker than the
//! governor admits, so requests past the bound reach it and are rejected
//! instead of queueing behind running graphs.

use council_application::{AskCouncilInput, CouncilError, CouncilService};
use serde::Deserialize;
use serde_json::{Value, json};
use std::io::{self, Read};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use tiny_http::{Header, Request, Response, Server};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

const HTTP_WORKER_MIN: usize = 4;
const HTTP_QUEUE_FACTOR: usize = 4;
const MAX_BODY_BYTES: u64 = 64 * 1024;

/// Reply produced by [`route`], independent of the transport
#[derive(Debug, Clone, PartialEq)]
pub struct ApiReply {
    pub status: u16,
    pub body: Option<Value>,
    /// Seconds for the `Retry-After` header
    pub retry_after: Option<u64>,
}

impl ApiReply {
    fn ok(body: Value) -> Self {
        Self {
            status: 200,
            body: Some(body),
            retry_after: None,
        }
    }

    fn no_content() -> Self {
        Self {
            status: 204,
            body: None,
            retry_after: None,
        }
    }

    fn error(status: u16, kind: &str, detail: impl Into<String>) -> Self {
        Self {
            status,
            body: Some(json!({ "error": kind, "detail": detail.into() })),
            retry_after: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AskBody {
    question: String,
}

const ROUTES: [&str; 5] = ["/", "/health", "/status", "/ask", "/ask/detailed"];

/// Dispatch one request against the council service
pub async fn route(
    service: &CouncilService,
    method: &str,
    url: &str,
    body: &str,
    caller: &str,
) -> ApiReply {
    let path = url.split('?').next().unwrap_or(url);
    match (method, path) {
        ("OPTIONS", _) => ApiReply::no_content(),
        ("GET", "/") => ApiReply::ok(index()),
        ("GET", "/health") => ApiReply::ok(json!({ "status": "ok" })),
        ("GET", "/status") => ApiReply::ok(status(service, caller)),
        ("POST", "/ask") => ask(service, body, caller, false).await,
        ("POST", "/ask/detailed") => ask(service, body, caller, true).await,
        (_, path) if ROUTES.contains(&path) => ApiReply::error(
            405,
            "method_not_allowed",
            format!("{} is not supported on {}", method, path),
        ),
        _ => ApiReply::error(404, "not_found", format!("no route for {}", path)),
    }
}

fn index() -> Value {
    json!({
        "service": "llm-council",
        "endpoints": {
            "GET /health": "liveness check",
            "GET /status": "concurrency and rate budget for the calling client",
            "POST /ask": "final answer only, body {\"question\": \"...\"}",
            "POST /ask/detailed": "every draft, critique and the synthesis",
        }
    })
}

fn status(service: &CouncilService, caller: &str) -> Value {
    json!({
        "members": service.members().iter().map(|m| m.as_str()).collect::<Vec<_>>(),
        "chairman": service.chairman().as_str(),
        "governor": serde_json::to_value(service.status(caller)).unwrap_or_default(),
    })
}

async fn ask(service: &CouncilService, body: &str, caller: &str, detail: bool) -> ApiReply {
    let parsed: AskBody = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(e) => {
            return ApiReply::error(
                400,
                "invalid_input",
                format!("expected a JSON body {{\"question\": \"...\"}}: {}", e),
            );
        }
    };

    let mut input = AskCouncilInput::new(parsed.question, caller);
    if detail {
        input = input.detailed();
    }

    match service.ask(input).await {
        Ok(response) => ApiReply::ok(serde_json::to_value(&response).unwrap_or_default()),
        Err(e) => error_reply(&e),
    }
}

fn status_for(error: &CouncilError) -> u16 {
    match error.kind() {
        "invalid_input" => 400,
        "rate_limit_exceeded" => 429,
        "capacity_exceeded" => 503,
        "graph_failure" => 502,
        "timeout" => 504,
        _ => 500,
    }
}

/// Map a council error to its HTTP reply
pub fn error_reply(error: &CouncilError) -> ApiReply {
    let mut reply = ApiReply::error(status_for(error), error.kind(), error.to_string());
    reply.retry_after = error
        .retry_after()
        .map(|d| d.as_secs() + u64::from(d.subsec_nanos() > 0));

    if let Some(body) = reply.body.as_mut().and_then(Value::as_object_mut) {
        if let Some(secs) = reply.retry_after {
            body.insert("retry_after_seconds".to_string(), json!(secs));
        }
        if let CouncilError::GraphFailure {
            partial: Some(partial),
            ..
        } = error
        {
            body.insert(
                "partial".to_string(),
                serde_json::to_value(partial.as_ref()).unwrap_or_default(),
            );
        }
    }
    reply
}

fn header(name: &str, value: &str) -> Option<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).ok()
}

fn caller_of(request: &Request) -> String {
    request
        .remote_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn respond(request: Request, reply: ApiReply) {
    let body = reply
        .body
        .as_ref()
        .map(|b| serde_json::to_string_pretty(b).unwrap_or_default())
        .unwrap_or_default();

    let mut response = Response::from_string(body).with_status_code(reply.status);
    let mut headers = vec![
        header("Content-Type", "application/json"),
        header("Access-Control-Allow-Origin", "*"),
        header("Access-Control-Allow-Headers", "Content-Type"),
        header("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
    ];
    if let Some(secs) = reply.retry_after {
        headers.push(header("Retry-After", &secs.to_string()));
    }
    for h in headers.into_iter().flatten() {
        response.add_header(h);
    }

    if let Err(e) = request.respond(response) {
        warn!("Failed to write response: {}", e);
    }
}

fn handle_request(mut request: Request, service: &CouncilService, runtime: &Handle) {
    let method = request.method().to_string();
    let url = request.url().to_string();
    let caller = caller_of(&request);

    let mut body = String::new();
    if let Err(e) = request
        .as_reader()
        .take(MAX_BODY_BYTES)
        .read_to_string(&mut body)
    {
        respond(
            request,
            ApiReply::error(400, "invalid_input", format!("unreadable body: {}", e)),
        );
        return;
    }

    debug!("{} {} from {}", method, url, caller);
    let reply = runtime.block_on(route(service, &method, &url, &body, &caller));
    info!("{} {} -> {}", method, url, reply.status);
    respond(request, reply);
}

fn worker_count(max_concurrent: usize) -> usize {
    thread::available_parallelism()
        .map(|v| v.get())
        .unwrap_or(HTTP_WORKER_MIN)
        .max(HTTP_WORKER_MIN)
        .max(max_concurrent.saturating_add(1))
}

/// Blocking HTTP server exposing a [`CouncilService`]
pub struct CouncilServer {
    server: Server,
    addr: String,
    service: Arc<CouncilService>,
}

impl CouncilServer {
    pub fn bind(addr: &str, service: Arc<CouncilService>) -> io::Result<Self> {
        let server = Server::http(addr).map_err(|e| io::Error::other(e.to_string()))?;
        Ok(Self {
            server,
            addr: addr.to_string(),
            service,
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Bound socket address, useful after binding port 0
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Serve until the listener closes. Must run off the async runtime,
    /// e.g. inside `spawn_blocking`.
    pub fn run(self, runtime: Handle) {
        let workers = worker_count(self.service.governor().max_concurrent());
        let (tx, rx) = mpsc::sync_channel::<Request>(workers * HTTP_QUEUE_FACTOR);
        let shared_rx = Arc::new(Mutex::new(rx));

        for _ in 0..workers {
            let worker_rx = Arc::clone(&shared_rx);
            let service = Arc::clone(&self.service);
            let runtime = runtime.clone();
            thread::spawn(move || {
                loop {
                    let request = {
                        let Ok(guard) = worker_rx.lock() else {
                            break;
                        };
                        match guard.recv() {
                            Ok(request) => request,
                            Err(_) => break,
                        }
                    };
                    handle_request(request, &service, &runtime);
                }
            });
        }

        info!("Council listening on http://{} ({} workers)", self.addr, workers);
        for request in self.server.incoming_requests() {
            if tx.send(request).is_err() {
                break;
            }
        }
    }
}

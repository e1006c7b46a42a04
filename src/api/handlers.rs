//! API Request Handlers
//!
//! One function per endpoint. Each sleeps its simulated latency, logs what
//! it did and returns the payload or an [`ApiFailure`]. Nothing is
//! persisted.

use crate::api::models::*;
use crate::api::source::MockDataSource;
use crate::realtime::DashboardStats;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Artificial delay per endpoint
pub mod latency {
    use std::time::Duration;

    pub const DASHBOARD_STATS: Duration = Duration::from_millis(300);
    pub const ANALYTICS: Duration = Duration::from_millis(800);
    pub const PROVIDERS: Duration = Duration::from_millis(500);
    pub const REQUESTS: Duration = Duration::from_millis(500);
    pub const UPDATE_STATUS: Duration = Duration::from_millis(1000);
    pub const ASSIGN: Duration = Duration::from_millis(800);
    pub const CANCEL: Duration = Duration::from_millis(800);
    pub const INVOICE: Duration = Duration::from_millis(1500);
}

/// Application state shared across handlers
pub struct AppState {
    /// Where the data comes from
    pub source: Arc<dyn MockDataSource>,
    /// Sleep the per-endpoint latency before answering
    pub simulate_latency: bool,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    pub fn new(source: Arc<dyn MockDataSource>, simulate_latency: bool) -> Self {
        Self {
            source,
            simulate_latency,
            start_time: Instant::now(),
        }
    }

    fn pause(&self, delay: Duration) {
        if self.simulate_latency && !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }

    fn attempt(&self, op: Operation, id: &str) -> ApiResult<()> {
        if self.source.should_fail(op) {
            warn!("Simulated {} failure for request {}", op, id);
            Err(ApiFailure::Simulated(op))
        } else {
            Ok(())
        }
    }
}

fn parse_body<T: serde::de::DeserializeOwned>(body: Option<&str>) -> ApiResult<T> {
    let body = body.ok_or_else(|| ApiFailure::invalid("request body required"))?;
    serde_json::from_str(body).map_err(|e| ApiFailure::invalid(e.to_string()))
}

fn require_id(id: &str) -> ApiResult<&str> {
    let id = id.trim();
    if id.is_empty() {
        Err(ApiFailure::invalid("request id is required"))
    } else {
        Ok(id)
    }
}

/// Handler for GET /api/health
pub fn handle_health(state: &AppState) -> HealthReport {
    HealthReport {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    }
}

/// Handler for GET /api/dashboard/stats
pub fn handle_dashboard_stats(state: &AppState) -> DashboardStats {
    state.pause(latency::DASHBOARD_STATS);
    let stats = state.source.dashboard_stats();
    info!("Served dashboard stats ({} requests, {} pending)", stats.total_requests, stats.pending_requests);
    stats
}

/// Handler for GET /api/analytics
pub fn handle_analytics(state: &AppState, period: Option<&str>) -> ApiResult<AnalyticsReport> {
    state.pause(latency::ANALYTICS);
    let period = period.map(str::parse::<AnalyticsPeriod>).transpose()?.unwrap_or_default();
    let report = state.source.analytics(period);
    info!("Served analytics for {} days", period.days());
    Ok(report)
}

/// Handler for GET /api/providers
pub fn handle_list_providers(state: &AppState, params: &PaginationParams) -> PaginatedResponse<Provider> {
    state.pause(latency::PROVIDERS);
    let page = params.paginate(state.source.providers());
    info!("Listed {} of {} providers", page.items.len(), page.total);
    page
}

/// Handler for POST /api/providers
pub fn handle_create_provider(state: &AppState, body: Option<&str>) -> ApiResult<Provider> {
    state.pause(latency::PROVIDERS);
    let request: CreateProviderRequest = parse_body(body)?;
    request.validate()?;

    let provider = Provider {
        id: state.source.next_id("p"),
        name: request.name.trim().to_string(),
        phone: request.phone.trim().to_string(),
        email: request.email,
        services: request.services,
        zone: request.zone.trim().to_string(),
        rating: 0.0,
        total_jobs: 0,
        status: ProviderStatus::Available,
        joined_at: state.source.now(),
    };
    info!("Created provider {} ({})", provider.id, provider.name);
    Ok(provider)
}

/// Handler for GET /api/requests
pub fn handle_list_requests(
    state: &AppState,
    params: &PaginationParams,
    status: Option<&str>,
) -> ApiResult<PaginatedResponse<ServiceRequest>> {
    state.pause(latency::REQUESTS);
    let status = status.map(str::parse::<RequestStatus>).transpose()?;

    let mut requests = state.source.requests();
    if let Some(status) = status {
        requests.retain(|r| r.status == status);
    }
    requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let page = params.paginate(requests);
    info!("Listed {} of {} requests", page.items.len(), page.total);
    Ok(page)
}

/// Handler for POST /api/requests/{id}/status
pub fn handle_update_status(state: &AppState, id: &str, body: Option<&str>) -> ApiResult<StatusUpdate> {
    state.pause(latency::UPDATE_STATUS);
    let id = require_id(id)?;
    let request: UpdateStatusRequest = parse_body(body)?;
    state.attempt(Operation::UpdateStatus, id)?;

    info!("Request {} moved to {}", id, request.status);
    Ok(StatusUpdate {
        id: id.to_string(),
        status: request.status,
        updated_at: state.source.now(),
    })
}

/// Handler for POST /api/requests/{id}/assign
pub fn handle_assign(state: &AppState, id: &str, body: Option<&str>) -> ApiResult<Assignment> {
    state.pause(latency::ASSIGN);
    let id = require_id(id)?;
    let request: AssignRequest = parse_body(body)?;
    if request.provider_id.trim().is_empty() {
        return Err(ApiFailure::invalid("providerId is required"));
    }
    state.attempt(Operation::Assign, id)?;

    info!("Request {} assigned to provider {}", id, request.provider_id);
    Ok(Assignment {
        request_id: id.to_string(),
        provider_id: request.provider_id,
        status: RequestStatus::Assigned,
        assigned_at: state.source.now(),
    })
}

/// Handler for POST /api/requests/{id}/cancel
pub fn handle_cancel(state: &AppState, id: &str, body: Option<&str>) -> ApiResult<Cancellation> {
    state.pause(latency::CANCEL);
    let id = require_id(id)?;
    let request: CancelRequest = match body {
        Some(body) if !body.trim().is_empty() => parse_body(Some(body))?,
        _ => CancelRequest::default(),
    };
    state.attempt(Operation::Cancel, id)?;

    info!("Request {} cancelled ({})", id, request.reason.as_deref().unwrap_or("no reason given"));
    Ok(Cancellation {
        request_id: id.to_string(),
        status: RequestStatus::Cancelled,
        reason: request.reason,
        cancelled_at: state.source.now(),
    })
}

/// Handler for GET /api/requests/{id}/invoice
pub fn handle_invoice(state: &AppState, id: &str) -> ApiResult<Vec<u8>> {
    state.pause(latency::INVOICE);
    let id = require_id(id)?;
    state.attempt(Operation::Invoice, id)?;

    let amount = state.source.invoice_amount(id);
    let pdf = render_invoice_pdf(id, amount, &state.source.now().format("%Y-%m-%d").to_string());
    info!("Generated invoice for request {} ({} bytes)", id, pdf.len());
    Ok(pdf)
}

/// Single-page PDF with the invoice lines
fn render_invoice_pdf(id: &str, amount: u32, date: &str) -> Vec<u8> {
    let text = format!(
        "BT /F1 18 Tf 72 720 Td (Djobea invoice #{}) Tj 0 -28 Td /F1 12 Tf (Date: {}) Tj 0 -18 Td (Amount: {} XAF) Tj ET",
        id, date, amount
    );

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >>"
            .to_string(),
        format!("<< /Length {} >>\nstream\n{}\nendstream", text.len(), text),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (n, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.push_str(&format!("{} 0 obj\n{}\nendobj\n", n + 1, body));
    }

    let xref = out.len();
    out.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for offset in offsets {
        out.push_str(&format!("{:010} 00000 n \n", offset));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref
    ));
    out.into_bytes()
}

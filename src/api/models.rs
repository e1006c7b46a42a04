//! API Data Models
//!
//! Data structures for the mock REST endpoints. Field names are camelCase on
//! the wire.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Response envelope shared by every JSON endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Operations that can fail by simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    UpdateStatus,
    Assign,
    Cancel,
    Invoice,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::UpdateStatus,
        Operation::Assign,
        Operation::Cancel,
        Operation::Invoice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UpdateStatus => "status update",
            Self::Assign => "assignment",
            Self::Cancel => "cancellation",
            Self::Invoice => "invoice generation",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handler failure, always reported as a 500 envelope
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiFailure {
    #[error("Simulated failure: {0} could not be completed")]
    Simulated(Operation),

    #[error("Invalid request: {0}")]
    Invalid(String),
}

impl ApiFailure {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

/// Result type for handlers
pub type ApiResult<T> = std::result::Result<T, ApiFailure>;

/// GET /api/health payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Provider availability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    Available,
    Busy,
    Offline,
}

/// Service provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub services: Vec<String>,
    pub zone: String,
    pub rating: f32,
    pub total_jobs: u32,
    pub status: ProviderStatus,
    pub joined_at: DateTime<Utc>,
}

/// POST /api/providers body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProviderRequest {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub services: Vec<String>,
    pub zone: String,
}

impl CreateProviderRequest {
    pub fn validate(&self) -> ApiResult<()> {
        if self.name.trim().is_empty() {
            return Err(ApiFailure::invalid("provider name is required"));
        }
        if self.phone.trim().is_empty() {
            return Err(ApiFailure::invalid("provider phone is required"));
        }
        if self.zone.trim().is_empty() {
            return Err(ApiFailure::invalid("provider zone is required"));
        }
        Ok(())
    }
}

/// Lifecycle of a job request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 5] = [
        RequestStatus::Pending,
        RequestStatus::Assigned,
        RequestStatus::InProgress,
        RequestStatus::Completed,
        RequestStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = ApiFailure;

    fn from_str(s: &str) -> ApiResult<Self> {
        Self::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| ApiFailure::invalid(format!("unknown request status '{}'", s)))
    }
}

/// Job request submitted by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub id: String,
    pub client_name: String,
    pub service_type: String,
    pub location: String,
    pub status: RequestStatus,
    pub provider_id: Option<String>,
    pub amount: u32,
    pub created_at: DateTime<Utc>,
}

/// POST /api/requests/{id}/status body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: RequestStatus,
}

/// Result of a status update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub id: String,
    pub status: RequestStatus,
    pub updated_at: DateTime<Utc>,
}

/// POST /api/requests/{id}/assign body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub provider_id: String,
}

/// Result of an assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub request_id: String,
    pub provider_id: String,
    pub status: RequestStatus,
    pub assigned_at: DateTime<Utc>,
}

/// POST /api/requests/{id}/cancel body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// Result of a cancellation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cancellation {
    pub request_id: String,
    pub status: RequestStatus,
    pub reason: Option<String>,
    pub cancelled_at: DateTime<Utc>,
}

/// Reporting window for analytics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnalyticsPeriod {
    #[serde(rename = "24h")]
    Day,
    #[default]
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
}

impl AnalyticsPeriod {
    /// Number of daily points in the series
    pub fn days(&self) -> u32 {
        match self {
            Self::Day => 1,
            Self::Week => 7,
            Self::Month => 30,
            Self::Quarter => 90,
        }
    }
}

impl FromStr for AnalyticsPeriod {
    type Err = ApiFailure;

    fn from_str(s: &str) -> ApiResult<Self> {
        match s {
            "24h" | "1d" => Ok(Self::Day),
            "7d" => Ok(Self::Week),
            "30d" => Ok(Self::Month),
            "90d" => Ok(Self::Quarter),
            other => Err(ApiFailure::invalid(format!("unknown analytics period '{}'", other))),
        }
    }
}

/// Headline indicators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub total_requests: u64,
    pub completed_requests: u64,
    pub completion_rate: f64,
    pub average_rating: f64,
    pub revenue: u64,
}

/// One day of the analytics series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub requests: u64,
    pub completed: u64,
    pub revenue: u64,
}

/// GET /api/analytics payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub period: AnalyticsPeriod,
    pub kpis: Kpis,
    pub daily: Vec<DailyPoint>,
}

impl AnalyticsReport {
    /// Derive the KPIs from a daily series
    pub fn from_daily(period: AnalyticsPeriod, daily: Vec<DailyPoint>, average_rating: f64) -> Self {
        let total_requests: u64 = daily.iter().map(|d| d.requests).sum();
        let completed_requests: u64 = daily.iter().map(|d| d.completed).sum();
        let revenue = daily.iter().map(|d| d.revenue).sum();
        let completion_rate = if total_requests == 0 {
            0.0
        } else {
            completed_requests as f64 / total_requests as f64 * 100.0
        };

        Self {
            period,
            kpis: Kpis {
                total_requests,
                completed_requests,
                completion_rate,
                average_rating,
                revenue,
            },
            daily,
        }
    }
}

/// Pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationParams {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: usize,
    /// Items per page
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

fn default_page() -> usize {
    1
}

fn default_per_page() -> usize {
    20
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PaginationParams {
    pub const MAX_PER_PAGE: usize = 100;

    /// Page at least 1, page size within 1..=MAX_PER_PAGE
    pub fn normalized(&self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, Self::MAX_PER_PAGE),
        }
    }

    /// Slice one page out of `all`
    pub fn paginate<T>(&self, all: Vec<T>) -> PaginatedResponse<T> {
        let params = self.normalized();
        let total = all.len();
        let items = all
            .into_iter()
            .skip(params.page.saturating_sub(1).saturating_mul(params.per_page))
            .take(params.per_page)
            .collect();
        PaginatedResponse::new(items, total, params.page, params.per_page)
    }
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    /// Items
    pub items: Vec<T>,
    /// Total items
    pub total: usize,
    /// Current page
    pub page: usize,
    /// Items per page
    pub per_page: usize,
    /// Total pages
    pub total_pages: usize,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: usize, page: usize, per_page: usize) -> Self {
        let total_pages = total.div_ceil(per_page.max(1));
        Self {
            items,
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shapes() {
        let ok = serde_json::to_value(Envelope::ok(3)).unwrap();
        assert_eq!(ok, serde_json::json!({"success": true, "data": 3}));

        let failed = serde_json::to_value(Envelope::<()>::failure("boom")).unwrap();
        assert_eq!(failed, serde_json::json!({"success": false, "error": "boom"}));
    }

    #[test]
    fn test_status_update_wire_names() {
        let update = StatusUpdate {
            id: "123".into(),
            status: RequestStatus::InProgress,
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["status"], "in_progress");
        assert!(value.get("updatedAt").is_some());
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!(serde_json::from_str::<UpdateStatusRequest>(r#"{"status":"done"}"#).is_err());
        assert!("done".parse::<RequestStatus>().is_err());
        assert_eq!("completed".parse::<RequestStatus>().unwrap(), RequestStatus::Completed);
    }

    #[test]
    fn test_period_parse() {
        assert_eq!("30d".parse::<AnalyticsPeriod>().unwrap(), AnalyticsPeriod::Month);
        assert!("1y".parse::<AnalyticsPeriod>().is_err());
        assert_eq!(serde_json::to_value(AnalyticsPeriod::Week).unwrap(), "7d");
    }

    #[test]
    fn test_pagination() {
        let params = PaginationParams { page: 2, per_page: 3 };
        let page = params.paginate((0..8).collect());
        assert_eq!(page.items, vec![3, 4, 5]);
        assert_eq!(page.total_pages, 3);

        let zero = PaginationParams { page: 0, per_page: 0 }.paginate(vec![1, 2]);
        assert_eq!((zero.page, zero.per_page, zero.items), (1, 1, vec![1]));
    }

    #[test]
    fn test_pagination_far_past_the_end() {
        let params = PaginationParams { page: usize::MAX, per_page: 2 };
        let page = params.paginate((0..8).collect::<Vec<u32>>());
        assert!(page.items.is_empty());
        assert_eq!(page.page, usize::MAX);
        assert_eq!(page.total, 8);
    }

    #[test]
    fn test_kpis_from_daily() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let report = AnalyticsReport::from_daily(
            AnalyticsPeriod::Day,
            vec![DailyPoint { date: day, requests: 4, completed: 3, revenue: 9000 }],
            4.5,
        );
        assert_eq!(report.kpis.completion_rate, 75.0);
        assert_eq!(report.kpis.revenue, 9000);
    }

    #[test]
    fn test_create_provider_validation() {
        let mut req = CreateProviderRequest {
            name: "Paul".into(),
            phone: "+237 6 99 00 11 22".into(),
            email: None,
            services: vec!["plumbing".into()],
            zone: "Bonamoussadi".into(),
        };
        assert!(req.validate().is_ok());
        req.zone = " ".into();
        assert!(matches!(req.validate(), Err(ApiFailure::Invalid(_))));
    }
}

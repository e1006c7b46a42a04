//! Djobea mock REST API
//!
//! Simulated backend for the dashboard. Every endpoint waits an artificial
//! latency and answers with randomized (or fixture) data wrapped in a
//! `{success, data}` / `{success, error}` envelope.
//!
//! ## API Endpoints
//!
//! | Endpoint | Method | Description |
//! |----------|--------|-------------|
//! | `/api/health` | GET | Liveness and version |
//! | `/api/dashboard/stats` | GET | Headline counters |
//! | `/api/analytics?period=7d` | GET | KPIs and daily series |
//! | `/api/providers` | GET | Paginated providers |
//! | `/api/providers` | POST | Register a provider |
//! | `/api/requests?status=` | GET | Paginated job requests |
//! | `/api/requests/{id}/status` | POST | Change request status |
//! | `/api/requests/{id}/assign` | POST | Assign a provider |
//! | `/api/requests/{id}/cancel` | POST | Cancel a request |
//! | `/api/requests/{id}/invoice` | GET | Invoice as PDF |

mod handlers;
mod models;
mod server;
mod source;

pub use handlers::*;
pub use models::*;
pub use server::*;
pub use source::*;

//! Data sources behind the mock endpoints
//!
//! [`RandomSource`] fabricates plausible values on every call.
//! [`FixtureSource`] returns fixed records and fails only the operations it
//! is told to, which keeps handler tests deterministic.

use super::models::*;
use crate::realtime::DashboardStats;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Supplies the data and the failure decisions for the handlers
pub trait MockDataSource: Send + Sync {
    fn dashboard_stats(&self) -> DashboardStats;

    fn analytics(&self, period: AnalyticsPeriod) -> AnalyticsReport;

    fn providers(&self) -> Vec<Provider>;

    fn requests(&self) -> Vec<ServiceRequest>;

    /// Whether this call to `op` should fail
    fn should_fail(&self, op: Operation) -> bool;

    /// Fresh identifier with the given prefix
    fn next_id(&self, prefix: &str) -> String;

    /// Timestamp stamped on mutations
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    /// Billed amount for a request, if known
    fn invoice_amount(&self, request_id: &str) -> u32 {
        self.requests()
            .into_iter()
            .find(|r| r.id == request_id)
            .map(|r| r.amount)
            .unwrap_or(0)
    }
}

const SERVICES: [&str; 6] = ["plumbing", "electrical", "cleaning", "painting", "carpentry", "gardening"];
const ZONES: [&str; 5] = ["Bonamoussadi", "Akwa", "Bonapriso", "Makepe", "Logpom"];
const NAMES: [&str; 8] = [
    "Jean Mbarga",
    "Aïcha Ngo",
    "Paul Essomba",
    "Marie Fotso",
    "Samuel Tchoua",
    "Grace Nkem",
    "Eric Mballa",
    "Sandrine Kamga",
];

/// Randomized data, failing fallible operations at `failure_rate`
#[derive(Debug)]
pub struct RandomSource {
    rng: Mutex<StdRng>,
    failure_rate: f64,
}

impl RandomSource {
    pub const DEFAULT_FAILURE_RATE: f64 = 0.05;

    pub fn new(failure_rate: f64) -> Self {
        Self::with_rng(StdRng::from_entropy(), failure_rate)
    }

    pub fn seeded(seed: u64, failure_rate: f64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), failure_rate)
    }

    fn with_rng(rng: StdRng, failure_rate: f64) -> Self {
        Self {
            rng: Mutex::new(rng),
            failure_rate: failure_rate.clamp(0.0, 1.0),
        }
    }

    pub fn failure_rate(&self) -> f64 {
        self.failure_rate
    }

    fn with<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut rng)
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FAILURE_RATE)
    }
}

fn pick<'a>(rng: &mut StdRng, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

impl MockDataSource for RandomSource {
    fn dashboard_stats(&self) -> DashboardStats {
        self.with(|rng| DashboardStats {
            total_requests: rng.gen_range(1000..1500),
            pending_requests: rng.gen_range(20..80),
            active_providers: rng.gen_range(150..250),
            last_update: Some(Utc::now()),
        })
    }

    fn analytics(&self, period: AnalyticsPeriod) -> AnalyticsReport {
        let today = Utc::now().date_naive();
        self.with(|rng| {
            let daily = (0..period.days())
                .rev()
                .map(|back| {
                    let requests = rng.gen_range(20..60);
                    let completed = rng.gen_range(requests / 2..=requests);
                    DailyPoint {
                        date: today - ChronoDuration::days(i64::from(back)),
                        requests,
                        completed,
                        revenue: completed * rng.gen_range(5_000..15_000),
                    }
                })
                .collect();
            AnalyticsReport::from_daily(period, daily, rng.gen_range(35..=50) as f64 / 10.0)
        })
    }

    fn providers(&self) -> Vec<Provider> {
        let now = Utc::now();
        self.with(|rng| {
            (1..=rng.gen_range(8..16))
                .map(|n| {
                    let name = pick(rng, &NAMES);
                    Provider {
                        id: format!("p-{}", n),
                        name: name.to_string(),
                        phone: format!("+237 6{:08}", rng.gen_range(0..100_000_000u32)),
                        email: rng.gen_bool(0.7).then(|| {
                            format!("{}@djobea.cm", name.to_lowercase().replace(' ', "."))
                        }),
                        services: SERVICES.choose_multiple(rng, 2).map(|s| s.to_string()).collect(),
                        zone: pick(rng, &ZONES).to_string(),
                        rating: rng.gen_range(30..=50) as f32 / 10.0,
                        total_jobs: rng.gen_range(0..400),
                        status: *[ProviderStatus::Available, ProviderStatus::Busy, ProviderStatus::Offline]
                            .choose(rng)
                            .unwrap_or(&ProviderStatus::Available),
                        joined_at: now - ChronoDuration::days(rng.gen_range(10..900)),
                    }
                })
                .collect()
        })
    }

    fn requests(&self) -> Vec<ServiceRequest> {
        let now = Utc::now();
        self.with(|rng| {
            (1..=rng.gen_range(20..40))
                .map(|n| {
                    let status = *RequestStatus::ALL.choose(rng).unwrap_or(&RequestStatus::Pending);
                    let assigned = !matches!(status, RequestStatus::Pending | RequestStatus::Cancelled);
                    ServiceRequest {
                        id: format!("{}", 100 + n),
                        client_name: pick(rng, &NAMES).to_string(),
                        service_type: pick(rng, &SERVICES).to_string(),
                        location: pick(rng, &ZONES).to_string(),
                        status,
                        provider_id: assigned.then(|| format!("p-{}", rng.gen_range(1..16))),
                        amount: rng.gen_range(5..50) * 1000,
                        created_at: now - ChronoDuration::minutes(rng.gen_range(5..10_000)),
                    }
                })
                .collect()
        })
    }

    fn should_fail(&self, _op: Operation) -> bool {
        self.failure_rate > 0.0 && self.with(|rng| rng.gen_bool(self.failure_rate))
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
    }

    fn invoice_amount(&self, _request_id: &str) -> u32 {
        self.with(|rng| rng.gen_range(5..50) * 1000)
    }
}

/// Fixed records and an explicit set of failing operations
#[derive(Debug)]
pub struct FixtureSource {
    stats: DashboardStats,
    providers: Vec<Provider>,
    requests: Vec<ServiceRequest>,
    failing: HashSet<Operation>,
    now: DateTime<Utc>,
    counter: AtomicU64,
}

impl FixtureSource {
    pub fn new() -> Self {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).single().unwrap_or_default();

        let providers = vec![
            Provider {
                id: "p-1".into(),
                name: "Jean Mbarga".into(),
                phone: "+237 690000001".into(),
                email: Some("jean.mbarga@djobea.cm".into()),
                services: vec!["plumbing".into()],
                zone: "Bonamoussadi".into(),
                rating: 4.8,
                total_jobs: 120,
                status: ProviderStatus::Available,
                joined_at: now - ChronoDuration::days(400),
            },
            Provider {
                id: "p-2".into(),
                name: "Marie Fotso".into(),
                phone: "+237 690000002".into(),
                email: None,
                services: vec!["cleaning".into(), "painting".into()],
                zone: "Akwa".into(),
                rating: 4.2,
                total_jobs: 45,
                status: ProviderStatus::Busy,
                joined_at: now - ChronoDuration::days(90),
            },
        ];

        let request = |id: &str, status, provider: Option<&str>, amount| ServiceRequest {
            id: id.to_string(),
            client_name: "Grace Nkem".into(),
            service_type: "plumbing".into(),
            location: "Makepe".into(),
            status,
            provider_id: provider.map(str::to_string),
            amount,
            created_at: now - ChronoDuration::hours(3),
        };
        let requests = vec![
            request("121", RequestStatus::Pending, None, 15_000),
            request("122", RequestStatus::Assigned, Some("p-1"), 20_000),
            request("123", RequestStatus::InProgress, Some("p-1"), 25_000),
            request("124", RequestStatus::Completed, Some("p-2"), 10_000),
            request("125", RequestStatus::Cancelled, None, 5_000),
        ];

        Self {
            stats: DashboardStats {
                total_requests: 1247,
                pending_requests: 42,
                active_providers: 189,
                last_update: Some(now),
            },
            providers,
            requests,
            failing: HashSet::new(),
            now,
            counter: AtomicU64::new(0),
        }
    }

    /// Make `op` fail on every call
    pub fn failing(mut self, op: Operation) -> Self {
        self.failing.insert(op);
        self
    }

    pub fn fixed_now(&self) -> DateTime<Utc> {
        self.now
    }
}

impl Default for FixtureSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDataSource for FixtureSource {
    fn dashboard_stats(&self) -> DashboardStats {
        self.stats.clone()
    }

    fn analytics(&self, period: AnalyticsPeriod) -> AnalyticsReport {
        let today = self.now.date_naive();
        let days = u64::from(period.days());
        let daily = (0..days)
            .map(|i| DailyPoint {
                date: today - ChronoDuration::days((days - 1 - i) as i64),
                requests: 10 + i,
                completed: 8 + i,
                revenue: (8 + i) * 10_000,
            })
            .collect();
        AnalyticsReport::from_daily(period, daily, 4.5)
    }

    fn providers(&self) -> Vec<Provider> {
        self.providers.clone()
    }

    fn requests(&self) -> Vec<ServiceRequest> {
        self.requests.clone()
    }

    fn should_fail(&self, op: Operation) -> bool {
        self.failing.contains(&op)
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.counter.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

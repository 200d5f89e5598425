use crate::{
    error::{AppError, AppResult},
    models::{self, Run, ReportStatus, User},
    services::cache::CacheService,
    store::{decode_all, Capabilities, Filter, Query, SharedStore, StoreResultExt},
};
use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use utoipa::ToSchema;

pub const DEFAULT_TOP_RACES: usize = 10;
pub const DEFAULT_HISTOGRAM_DAYS: u32 = 30;
pub const MAX_HISTOGRAM_DAYS: u32 = 366;

const DASHBOARD_CACHE_PREFIX: &str = "stats:dashboard";

/// Trailing range used to scope "new" counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum StatsWindow {
    #[serde(rename = "7")]
    Week,
    #[default]
    #[serde(rename = "30")]
    Month,
    #[serde(rename = "90")]
    Quarter,
    #[serde(rename = "all")]
    All,
}

impl StatsWindow {
    pub fn days(self) -> Option<i64> {
        match self {
            StatsWindow::Week => Some(7),
            StatsWindow::Month => Some(30),
            StatsWindow::Quarter => Some(90),
            StatsWindow::All => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatsWindow::Week => "7",
            StatsWindow::Month => "30",
            StatsWindow::Quarter => "90",
            StatsWindow::All => "all",
        }
    }

    /// Lower bound for "new" records; `None` means unbounded.
    pub fn start(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.days().map(|days| now - Duration::days(days))
    }
}

impl FromStr for StatsWindow {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "7" => Ok(StatsWindow::Week),
            "30" => Ok(StatsWindow::Month),
            "90" => Ok(StatsWindow::Quarter),
            "all" => Ok(StatsWindow::All),
            other => Err(AppError::Validation(format!(
                "window must be one of: 7, 30, 90, all (got '{}')",
                other
            ))),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_users: u64,
    pub new_users: u64,
    pub total_runs: u64,
    pub new_runs: u64,
    pub total_crews: u64,
    pub pending_reports: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RaceCount {
    pub race_name: String,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DailyBucket {
    pub date: NaiveDate,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub window: StatsWindow,
    pub summary: Summary,
    pub top_races: Vec<RaceCount>,
    pub daily_runs: Vec<DailyBucket>,
}

fn created_within(created_at: Option<DateTime<Utc>>, start: Option<DateTime<Utc>>) -> bool {
    match start {
        None => true,
        Some(start) => created_at.is_some_and(|ts| ts >= start),
    }
}

/// Most frequent race names among race runs, highest count first. Ties keep
/// the order in which the names were first seen.
pub fn top_races(runs: &[Run], n: usize) -> Vec<RaceCount> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<RaceCount> = Vec::new();

    for name in runs.iter().filter_map(Run::race) {
        match index.get(name) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(name, counts.len());
                counts.push(RaceCount {
                    race_name: name.to_string(),
                    count: 1,
                });
            }
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(n);
    counts
}

/// Dense per-day run counts for the `days` calendar days ending today, in
/// the time zone of `now`. Oldest day first. Each run is converted with the
/// offset in effect at its own instant, so DST changes inside the range
/// keep runs on their local calendar day.
pub fn daily_histogram<Tz: TimeZone>(runs: &[Run], days: u32, now: &DateTime<Tz>) -> Vec<DailyBucket> {
    if days == 0 {
        return Vec::new();
    }

    let today = now.date_naive();
    let first = today - Duration::days(i64::from(days) - 1);
    let mut buckets: Vec<DailyBucket> = (0..days)
        .map(|offset| DailyBucket {
            date: first + Duration::days(i64::from(offset)),
            count: 0,
        })
        .collect();

    let tz = now.timezone();
    for created_at in runs.iter().filter_map(|r| r.created_at) {
        let day = created_at.with_timezone(&tz).date_naive();
        if day < first || day > today {
            continue;
        }
        let idx = (day - first).num_days() as usize;
        buckets[idx].count += 1;
    }

    buckets
}

pub struct StatsService {
    store: SharedStore,
    capabilities: Capabilities,
    cache: Option<CacheService>,
    cache_ttl_secs: u64,
}

impl StatsService {
    pub fn new(store: SharedStore, capabilities: Capabilities) -> Self {
        Self {
            store,
            capabilities,
            cache: None,
            cache_ttl_secs: 0,
        }
    }

    pub fn with_cache(mut self, cache: Option<CacheService>, ttl_secs: u64) -> Self {
        self.cache = cache;
        self.cache_ttl_secs = ttl_secs;
        self
    }

    /// Drops cached dashboards. Call after any write to reports, crews or runs.
    pub async fn invalidate(cache: Option<&CacheService>) {
        if let Some(cache) = cache {
            cache
                .invalidate_pattern(&format!("{}:*", DASHBOARD_CACHE_PREFIX))
                .await;
        }
    }

    pub async fn compute_summary(&self, window: StatsWindow) -> AppResult<Summary> {
        let runs: Vec<Run> = self.load(models::RUNS).await?;
        self.summarize(window, &runs, Utc::now()).await
    }

    pub async fn dashboard(&self, window: StatsWindow, days: u32) -> AppResult<Dashboard> {
        let key = format!("{}:{}:{}", DASHBOARD_CACHE_PREFIX, window.as_str(), days);
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get::<Dashboard>(&key).await {
                tracing::debug!("Dashboard cache hit: {}", key);
                return Ok(cached);
            }
        }

        let dashboard = self.dashboard_at(window, days, Local::now()).await?;

        if let Some(cache) = &self.cache {
            cache.set(&key, &dashboard, self.cache_ttl_secs).await;
        }
        Ok(dashboard)
    }

    /// Dashboard as seen at `now`; its time zone decides the histogram's days.
    pub async fn dashboard_at<Tz>(
        &self,
        window: StatsWindow,
        days: u32,
        now: DateTime<Tz>,
    ) -> AppResult<Dashboard>
    where
        Tz: TimeZone + Send + Sync,
        Tz::Offset: Send + Sync,
    {
        if days == 0 || days > MAX_HISTOGRAM_DAYS {
            return Err(AppError::Validation(format!(
                "days must be between 1 and {}",
                MAX_HISTOGRAM_DAYS
            )));
        }

        let now_utc = now.with_timezone(&Utc);
        let runs: Vec<Run> = self.load(models::RUNS).await?;
        let summary = self.summarize(window, &runs, now_utc).await?;

        let start = window.start(now_utc);
        let windowed: Vec<Run> = runs
            .iter()
            .filter(|r| created_within(r.created_at, start))
            .cloned()
            .collect();

        Ok(Dashboard {
            window,
            summary,
            top_races: top_races(&windowed, DEFAULT_TOP_RACES),
            daily_runs: daily_histogram(&runs, days, &now),
        })
    }

    async fn summarize(
        &self,
        window: StatsWindow,
        runs: &[Run],
        now: DateTime<Utc>,
    ) -> AppResult<Summary> {
        let start = window.start(now);

        // users are filtered on parsed timestamps like runs, so stored
        // offsets other than Z compare by instant
        let users: Vec<User> = self.load(models::USERS).await?;
        let total_users = users.len() as u64;
        let new_users = users
            .iter()
            .filter(|u| created_within(u.created_at, start))
            .count() as u64;

        let total_runs = runs.len() as u64;
        let new_runs = runs
            .iter()
            .filter(|r| created_within(r.created_at, start))
            .count() as u64;

        let total_crews = self.count(models::CREWS, Query::new()).await?;
        let pending_reports = self
            .count(
                models::REPORTS,
                Query::new().filter(Filter::eq("status", ReportStatus::Pending.as_str())),
            )
            .await?;

        Ok(Summary {
            total_users,
            new_users,
            total_runs,
            new_runs,
            total_crews,
            pending_reports,
        })
    }

    /// Every decodable record of `collection`; missing collections are empty.
    async fn load<T: DeserializeOwned>(&self, collection: &str) -> AppResult<Vec<T>> {
        if !self.capabilities.has(collection) {
            return Ok(Vec::new());
        }
        let docs = self
            .store
            .query(collection, &Query::new())
            .await
            .or_empty()?;
        Ok(decode_all(collection, docs))
    }

    /// Missing collections count as zero.
    async fn count(&self, collection: &str, query: Query) -> AppResult<u64> {
        if !self.capabilities.has(collection) {
            return Ok(0);
        }
        Ok(self.store.count(collection, &query).await.or_empty()?)
    }
}

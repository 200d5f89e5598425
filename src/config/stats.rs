use std::env;

#[derive(Debug, Clone, Copy)]
pub struct StatsConfig {
    /// Seconds a computed dashboard stays cached; 0 disables caching.
    pub cache_ttl_secs: u64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self { cache_ttl_secs: 60 }
    }
}

impl StatsConfig {
    pub fn from_env() -> Self {
        let cache_ttl_secs = env::var("STATS_CACHE_TTL")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(Self::default().cache_ttl_secs);
        Self { cache_ttl_secs }
    }
}

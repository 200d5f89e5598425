use super::parse_bool_env;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub per_second: u64,
    pub burst_size: u32,
}

impl RateLimitRule {
    const fn new(per_second: u64, burst_size: u32) -> Self {
        Self {
            per_second,
            burst_size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitGroup {
    /// Unauthenticated callable functions (verification email).
    Functions,
    /// Authenticated report intake and the admin API.
    Protected,
}

impl RateLimitGroup {
    fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "functions" | "function" | "fn" => Some(Self::Functions),
            "protected" | "admin" => Some(Self::Protected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub functions: RateLimitRule,
    pub protected: RateLimitRule,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // Each call sends an email, keep it tight.
            functions: RateLimitRule::new(10, 3),
            protected: RateLimitRule::new(10, 20),
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.enabled = parse_bool_env("RATE_LIMIT_ENABLED", cfg.enabled);

        if let Ok(raw) = env::var("RATE_LIMIT_CONFIG") {
            match parse_overrides(&raw) {
                Ok(overrides) => cfg = cfg.apply(&overrides),
                Err(err) => {
                    tracing::warn!("Invalid RATE_LIMIT_CONFIG '{}': {}", raw, err);
                }
            }
        }

        cfg
    }

    pub fn rule(&self, group: RateLimitGroup) -> RateLimitRule {
        match group {
            RateLimitGroup::Functions => self.functions,
            RateLimitGroup::Protected => self.protected,
        }
    }

    fn apply(mut self, overrides: &[(Option<RateLimitGroup>, RateLimitRule)]) -> Self {
        for (group, rule) in overrides {
            match group {
                None => {
                    self.functions = *rule;
                    self.protected = *rule;
                }
                Some(RateLimitGroup::Functions) => self.functions = *rule,
                Some(RateLimitGroup::Protected) => self.protected = *rule,
            }
        }
        self
    }
}

/// Accepts either a bare `per:burst` for every group or a list such as
/// `functions=1:3,protected=10:20`. A `None` group means all groups.
fn parse_overrides(raw: &str) -> Result<Vec<(Option<RateLimitGroup>, RateLimitRule)>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("empty value".to_string());
    }

    if !trimmed.contains('=') {
        return Ok(vec![(None, parse_rule(trimmed)?)]);
    }

    trimmed
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let (name, raw_rule) = item
                .split_once('=')
                .ok_or_else(|| format!("invalid item '{}', expected name=per:burst", item))?;
            let group = RateLimitGroup::parse(name).ok_or_else(|| {
                format!(
                    "unknown group '{}', expected functions/protected",
                    name.trim()
                )
            })?;
            Ok((Some(group), parse_rule(raw_rule.trim())?))
        })
        .collect()
}

fn parse_rule(raw: &str) -> Result<RateLimitRule, String> {
    let (per_second_raw, burst_raw) = raw
        .split_once(':')
        .ok_or_else(|| format!("invalid rule '{}', expected per:burst", raw))?;

    let per_second: u64 = per_second_raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid per_second '{}'", per_second_raw.trim()))?;
    let burst_size: u32 = burst_raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid burst_size '{}'", burst_raw.trim()))?;

    if per_second == 0 || burst_size == 0 {
        return Err("per_second and burst_size must be > 0".to_string());
    }

    Ok(RateLimitRule::new(per_second, burst_size))
}

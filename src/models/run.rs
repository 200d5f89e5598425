use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunType {
    Race,
    Casual,
    #[default]
    #[serde(other)]
    Other,
}

/// Logged running activity. Runs are owned by the user-facing app, so every
/// field tolerates absence.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub run_type: RunType,
    #[serde(default)]
    pub race_name: Option<String>,
    /// Kilometres.
    #[serde(default)]
    pub distance: Option<f64>,
    /// Seconds.
    #[serde(default)]
    pub time: Option<f64>,
    #[serde(default, with = "super::timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_public: bool,
}

impl Run {
    /// Race name of a race run, if it has a non-empty one.
    pub fn race(&self) -> Option<&str> {
        if self.run_type != RunType::Race {
            return None;
        }
        self.race_name.as_deref().filter(|name| !name.is_empty())
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CrewStatus {
    Pending,
    Approved,
}

impl CrewStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CrewStatus::Pending => "pending",
            CrewStatus::Approved => "approved",
        }
    }
}

impl FromStr for CrewStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CrewStatus::Pending),
            "approved" => Ok(CrewStatus::Approved),
            other => Err(format!(
                "status must be one of: pending, approved (got '{}')",
                other
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Crew {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub leader_id: Option<String>,
    pub status: CrewStatus,
    #[serde(default, with = "super::timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "super::timestamp::option")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub approved_by: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CrewMember {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, with = "super::timestamp::option")]
    pub joined_at: Option<DateTime<Utc>>,
}

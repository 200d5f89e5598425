use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default, with = "super::timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "super::timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
}

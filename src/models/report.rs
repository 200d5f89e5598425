use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Processing,
    Resolved,
    Dismissed,
}

impl ReportStatus {
    pub const ALL: [ReportStatus; 4] = [
        ReportStatus::Pending,
        ReportStatus::Processing,
        ReportStatus::Resolved,
        ReportStatus::Dismissed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Processing => "processing",
            ReportStatus::Resolved => "resolved",
            ReportStatus::Dismissed => "dismissed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ReportStatus::Resolved | ReportStatus::Dismissed)
    }

    /// Transition table. Nothing returns to `pending`, nothing leaves a
    /// terminal state, and `processing` may only be closed.
    pub fn can_transition_to(self, next: ReportStatus) -> bool {
        use ReportStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Resolved)
                | (Pending, Dismissed)
                | (Processing, Resolved)
                | (Processing, Dismissed)
        )
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "status must be one of: pending, processing, resolved, dismissed (got '{}')",
                    s
                )
            })
    }
}

/// Kind of reported content.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportKind {
    Run,
    Comment,
    Post,
    User,
}

impl ReportKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "run" => Some(ReportKind::Run),
            "comment" => Some(ReportKind::Comment),
            "post" => Some(ReportKind::Post),
            "user" => Some(ReportKind::User),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReportKind::Run => "Run record",
            ReportKind::Comment => "Comment",
            ReportKind::Post => "Post",
            ReportKind::User => "User",
        }
    }

    /// Collection holding the reported content. Users are never deleted by
    /// moderation.
    pub fn content_collection(self) -> Option<&'static str> {
        match self {
            ReportKind::Run => Some(super::RUNS),
            ReportKind::Comment => Some(super::COMMENTS),
            ReportKind::Post => Some(super::POSTS),
            ReportKind::User => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportCategory {
    Spam,
    Inappropriate,
    Harassment,
    Other,
}

impl ReportCategory {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "spam" => Some(ReportCategory::Spam),
            "inappropriate" => Some(ReportCategory::Inappropriate),
            "harassment" => Some(ReportCategory::Harassment),
            "other" => Some(ReportCategory::Other),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReportCategory::Spam => "Spam",
            ReportCategory::Inappropriate => "Inappropriate content",
            ReportCategory::Harassment => "Harassment",
            ReportCategory::Other => "Other",
        }
    }
}

/// Display label for a stored category; unknown values pass through.
pub fn category_label(raw: &str) -> &str {
    ReportCategory::parse(raw).map_or(raw, |c| c.label())
}

/// Display label for a stored report type; unknown values pass through.
pub fn type_label(raw: &str) -> &str {
    ReportKind::parse(raw).map_or(raw, |k| k.label())
}

/// Moderation ticket. `type` and `category` stay raw strings so legacy
/// values still load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    #[serde(rename = "type")]
    pub report_type: String,
    pub target_id: String,
    #[serde(default)]
    pub target_user_id: Option<String>,
    #[serde(default)]
    pub reporter_id: Option<String>,
    pub category: String,
    #[serde(default)]
    pub reason: Option<String>,
    pub status: ReportStatus,
    #[serde(default, with = "super::timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "super::timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, with = "super::timestamp::option")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolved_by: Option<String>,
    #[serde(default)]
    pub admin_note: Option<String>,
}

impl Report {
    pub fn kind(&self) -> Option<ReportKind> {
        ReportKind::parse(&self.report_type)
    }
}

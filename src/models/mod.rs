pub mod crew;
pub mod notice;
pub mod report;
pub mod run;
pub mod timestamp;
pub mod user;

pub use crew::{Crew, CrewMember, CrewStatus};
pub use notice::Notice;
pub use report::{Report, ReportCategory, ReportKind, ReportStatus};
pub use run::{Run, RunType};
pub use user::User;

pub const USERS: &str = "users";
pub const RUNS: &str = "runs";
pub const REPORTS: &str = "reports";
pub const CREWS: &str = "crews";
pub const NOTICES: &str = "notices";
pub const COMMENTS: &str = "comments";
pub const POSTS: &str = "posts";
pub const RACES: &str = "races";

/// Top-level collections registered at startup.
pub const KNOWN_COLLECTIONS: &[&str] =
    &[USERS, RUNS, REPORTS, CREWS, NOTICES, COMMENTS, POSTS, RACES];

/// Membership sub-collection of a crew.
pub fn crew_members(crew_id: &str) -> String {
    format!("{}/{}/members", CREWS, crew_id)
}

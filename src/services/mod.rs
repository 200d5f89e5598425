pub mod admin;
pub mod bootstrap_admin;
pub mod cache;
pub mod crew;
pub mod email;
pub mod notice;
pub mod report;
pub mod stats;

pub mod admin;
pub mod crew;
pub mod functions;
pub mod notice;
pub mod report;

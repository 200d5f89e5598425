pub mod auth;
pub mod security;

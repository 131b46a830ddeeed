//! HTTP inbound adapter exposing REST endpoints.

pub mod app;
pub mod auth;
pub mod authenticated;
pub mod cookies;
pub mod error;
pub mod health;
pub mod request_meta;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

pub use error::ApiResult;

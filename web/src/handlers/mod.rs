//! HTTP request handlers.

pub mod dispatch;
pub mod health;

pub use dispatch::{dispatch_json, dispatch_query};
pub use health::{health_check, readiness};

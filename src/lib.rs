pub mod apis;
pub mod config;
pub mod error;
pub mod logging;
pub mod notify;
pub mod observability;
pub mod pipeline;
pub mod types;

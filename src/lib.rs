//! Weekly activity recap pipeline: aggregates a user's exercise and diet
//! check-ins over a fixed 7-day window into a sanitized, summarized
//! structure for a downstream report generator.

pub mod batch;
pub mod categorize;
pub mod db;
pub mod error;
pub mod fetch;
pub mod models;
pub mod sanitize;
pub mod service;
pub mod stats;
pub mod window;

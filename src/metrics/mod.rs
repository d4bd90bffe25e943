//! Metrics for the court-ratings build pipeline
//!
//! A collector is created per run and rendered to the Prometheus text format
//! alongside the other artifacts.

pub mod collector;

pub use collector::{
    FeedMetrics, HeadToHeadMetrics, MetricsCollector, MetricsTimer, ReplayMetrics,
};

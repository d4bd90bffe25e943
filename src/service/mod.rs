//! Service layer for the court-ratings pipeline
//!
//! This module contains the application state that runs the build pipeline
//! and answers queries from the exported artifacts.

pub mod app;

pub use app::{
    AppState, BuildOutput, BuildReport, FeedOrder, HeadToHeadRecord, Prediction, ServiceError,
};

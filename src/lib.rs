//! Deterministic, explainable outcome calls (home win / draw / away win) for scheduled football
//! fixtures, built from recent form, multi-season statistics and head-to-head history.

pub mod config;
pub mod context;
pub mod engine;
pub mod form;
pub mod head_to_head;
pub mod history;
pub mod model;
pub mod report;
pub mod scorer;
pub mod statistics;
pub mod store;
pub mod synthetic;

pub use config::EngineConfig;
pub use engine::PredictionEngine;
pub use history::{InMemoryHistory, MatchHistory};
pub use model::{Fixture, Outcome, PredictionResult};

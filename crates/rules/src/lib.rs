//! Creative-fatigue rule engine.
//!
//! This crate provides:
//! - Per-entity grouping and trailing-window slicing of daily observations
//! - Rolling baselines over the days before the latest one
//! - Typed thresholds parsed from a loosely typed settings map
//! - The four fatigue rules and their verdict
//! - An evaluation driver that feeds verdicts to record and alert sinks

pub mod baseline;
pub mod driver;
pub mod evaluator;
pub mod thresholds;
pub mod windowing;

pub use baseline::{rolling_baseline, Baseline};
pub use driver::{AlertSink, EvaluationDriver, RecordSink, RunSettings, RunSummary, SinkError};
pub use evaluator::{evaluate, evaluate_rules, pct_change, Assessment, FatigueRule, Verdict};
pub use thresholds::ThresholdConfig;

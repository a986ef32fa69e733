//! Pipeline orchestration: one tick ranks, aggregates and appends.

mod orchestrator;

pub use orchestrator::{PipelineSettings, PricePipeline, TickOutcome};

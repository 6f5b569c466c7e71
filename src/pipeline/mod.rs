//! Concurrent paper-processing pipeline.
//!
//! Discovery feeds a bounded pool of per-paper workers; every completion call
//! passes through one shared rate limiter. See [`PipelineOrchestrator`] for
//! the entry point.

pub mod config;
pub mod limiter;
pub mod orchestrator;
pub mod worker;

pub use config::{ConfigError, PipelineConfig, SourceKind};
pub use limiter::RateLimiter;
pub use orchestrator::{PipelineError, PipelineOrchestrator, RunSummary};
pub use worker::{PaperOutcome, PaperWorker};

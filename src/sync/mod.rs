//! The download-and-dedup core: ledger, naming, pipeline, batch runner

pub mod engine;
pub mod ledger;
pub mod naming;
pub mod pipeline;
pub mod transcode;

pub use engine::{run_batch, BatchReport};
pub use ledger::Ledger;
pub use pipeline::{PipelineOptions, TrackOutcome, TrackPipeline};

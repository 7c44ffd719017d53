//! Shared utilities

pub mod tags;

pub use tags::{LoftyTagger, Tagger};

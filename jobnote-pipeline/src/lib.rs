//! The URL → Markdown record pipeline.
//!
//! Stages run strictly in sequence and the first failure ends the run:
//! render, select, extract, format, assemble, persist. Only formatting
//! recovers locally, by keeping the plain description.

pub mod format;
pub mod pipeline;

pub use format::{DescriptionFormatter, FormatKind, FormatOutcome};
pub use pipeline::{Pipeline, PipelineOutcome};

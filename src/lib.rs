// GuidSleuth - lib.rs
//
// Library entry point, exposing every layer for the CLI binary, integration
// tests and programmatic use.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;

pub use crate::core::identifier::Identifier;
pub use crate::core::pipeline::{extract, ExtractionConfig, ExtractionPipeline};

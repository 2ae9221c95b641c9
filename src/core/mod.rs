// GuidSleuth - core/mod.rs
//
// Core extraction logic layer.
// Dependencies: util, regex, walkdir, glob, serde.
// Must NOT depend on: platform or app.

pub mod corpus;
pub mod discovery;
pub mod identifier;
pub mod keyword;
pub mod model;
pub mod path_pattern;
pub mod pipeline;
pub mod rules;
pub mod scanner;
pub mod vote;

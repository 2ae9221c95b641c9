// GuidSleuth - app/mod.rs
//
// Application layer: run orchestration, rule loading, reporting.
// Dependencies: core, platform, util.

pub mod report;
pub mod rules_mgr;
pub mod run;

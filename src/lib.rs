//! dossierhelper - document inventory and portfolio classification.
//!
//! Discovers documents across local folders and remote drives, classifies
//! each against a configurable rule set, estimates effort, and emits a CSV
//! report. The three passes are exposed through [`pipeline::Pipeline`] with
//! a typed progress event stream for UI consumers.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod drive;
pub mod extract;
pub mod metadata;
pub mod models;
pub mod pipeline;
pub mod report;

//! # realign-demos
//!
//! Motion-correction demos over public fMRI datasets.
//!
//! Each demo locates a dataset in a local cache, groups its functional files
//! into per-subject processing units and drives a fit → transform → report
//! pipeline over them.
//!
//! ## Modules
//!
//! - `app` - Binary-level logging and fatal error handling
//! - `config` - TOML configuration with `REALIGN_*` environment overrides
//! - `dataset` - Dataset registry and cache lookup
//! - `demos` - One entry point per dataset plus `run_all`
//! - `engine` - Motion-correction engine seam and the command-backed engine
//! - `error` - Error types with stable numeric codes
//! - `orchestrator` - Sequential per-subject pipeline
//! - `report` - Realignment-parameter summaries
//! - `subject` - Subject records and the grouping factories
//! - `subprocess` - Subprocess abstraction with a mock runner for tests
//! - `testing` - Recording mocks and fixtures
pub mod app;
pub mod config;
pub mod dataset;
pub mod demos;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod report;
pub mod subject;
pub mod subprocess;

pub mod testing;

pub use error::{DemoError, ErrorCode, Result};

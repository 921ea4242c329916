//! Motion diagnostics
//!
//! A [`Reporter`] receives one realignment-parameter file per session and a
//! title, then presents everything rendered so far when `show` is called.

pub mod prompt;
pub mod summary;

pub use prompt::{DismissPrompt, StdinPrompt};
pub use summary::{MotionSummary, SummaryReporter};

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

#[async_trait]
pub trait Reporter: Send + Sync {
    /// Render diagnostics for one realignment-parameter file
    async fn render(&self, parameter_file: &Path, title: &str) -> Result<()>;

    /// Present pending diagnostics, blocking until the user dismisses them
    async fn show(&self) -> Result<()>;
}

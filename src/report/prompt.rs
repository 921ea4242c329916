//! Blocking "press Enter" step

use crate::error::{DemoError, ErrorCode, Result};
use async_trait::async_trait;
use std::io::{self, Write};

#[async_trait]
pub trait DismissPrompt: Send + Sync {
    /// Print `message` and wait until the user dismisses it
    async fn wait_for_enter(&self, message: &str) -> Result<()>;
}

/// Reads a line from stdin on the blocking pool
pub struct StdinPrompt;

impl Default for StdinPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl StdinPrompt {
    pub fn new() -> Self {
        Self
    }

    fn read_line(message: &str) -> io::Result<()> {
        print!("{message}");
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(())
    }
}

#[async_trait]
impl DismissPrompt for StdinPrompt {
    async fn wait_for_enter(&self, message: &str) -> Result<()> {
        let message = message.to_string();
        tokio::task::spawn_blocking(move || Self::read_line(&message))
            .await
            .map_err(|e| {
                DemoError::report_with_code(
                    ErrorCode::REPORT_DISPLAY_FAILED,
                    "prompt task failed",
                    None,
                )
                .with_source(e)
            })?
            .map_err(|e| {
                DemoError::report_with_code(
                    ErrorCode::REPORT_DISPLAY_FAILED,
                    "cannot read from stdin",
                    None,
                )
                .with_source(e)
            })
    }
}

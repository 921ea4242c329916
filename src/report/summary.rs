//! Text summary of realignment parameters
//!
//! Parameter files hold one row per volume with six columns: translations
//! along x, y, z in millimetres followed by pitch, roll, yaw in radians.

use super::prompt::{DismissPrompt, StdinPrompt};
use super::Reporter;
use crate::error::{DemoError, ErrorCode, Result};
use async_trait::async_trait;
use std::fmt;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

const PARAMETER_COLUMNS: usize = 6;

/// Peak absolute motion estimated for one session
#[derive(Debug, Clone, PartialEq)]
pub struct MotionSummary {
    pub title: String,
    pub parameter_file: PathBuf,
    pub volumes: usize,
    /// Peak |x|, |y|, |z| translation in mm
    pub max_translation: [f64; 3],
    /// Peak |pitch|, |roll|, |yaw| in radians
    pub max_rotation: [f64; 3],
}

impl MotionSummary {
    /// Parse the contents of a realignment-parameter file
    pub fn parse(title: &str, parameter_file: &Path, content: &str) -> Result<Self> {
        let mut summary = Self {
            title: title.to_string(),
            parameter_file: parameter_file.to_path_buf(),
            volumes: 0,
            max_translation: [0.0; 3],
            max_rotation: [0.0; 3],
        };

        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let values = line
                .split_whitespace()
                .map(str::parse::<f64>)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| malformed(parameter_file, index + 1, e.to_string()))?;
            if values.len() != PARAMETER_COLUMNS {
                return Err(malformed(
                    parameter_file,
                    index + 1,
                    format!("expected {} columns, found {}", PARAMETER_COLUMNS, values.len()),
                ));
            }

            for axis in 0..3 {
                summary.max_translation[axis] = summary.max_translation[axis].max(values[axis].abs());
                summary.max_rotation[axis] = summary.max_rotation[axis].max(values[axis + 3].abs());
            }
            summary.volumes += 1;
        }

        if summary.volumes == 0 {
            return Err(DemoError::report_with_code(
                ErrorCode::REPORT_MALFORMED,
                "realignment parameter file has no volumes",
                Some(parameter_file.to_path_buf()),
            ));
        }

        Ok(summary)
    }
}

fn malformed(path: &Path, line: usize, detail: String) -> DemoError {
    DemoError::report_with_code(
        ErrorCode::REPORT_MALFORMED,
        format!("line {}: {}", line, detail),
        Some(path.to_path_buf()),
    )
}

impl fmt::Display for MotionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [tx, ty, tz] = self.max_translation;
        let [rx, ry, rz] = self.max_rotation;
        writeln!(f, "{}", self.title)?;
        writeln!(
            f,
            "  {} ({} volumes)",
            self.parameter_file.display(),
            self.volumes
        )?;
        writeln!(f, "  peak translation (mm):  x {tx:.4}  y {ty:.4}  z {tz:.4}")?;
        write!(
            f,
            "  peak rotation (deg):    pitch {:.4}  roll {:.4}  yaw {:.4}",
            rx.to_degrees(),
            ry.to_degrees(),
            rz.to_degrees()
        )
    }
}

/// Collects summaries on `render` and prints them on `show`
pub struct SummaryReporter {
    pending: Mutex<Vec<MotionSummary>>,
    wait: bool,
    prompt: Arc<dyn DismissPrompt>,
}

impl SummaryReporter {
    /// Reporter that waits for Enter when `wait` is set and stdin is a terminal
    pub fn new(wait: bool) -> Self {
        Self::with_prompt(wait && std::io::stdin().is_terminal(), Arc::new(StdinPrompt::new()))
    }

    pub fn with_prompt(wait: bool, prompt: Arc<dyn DismissPrompt>) -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            wait,
            prompt,
        }
    }

    /// Summaries rendered since the last `show`
    pub fn pending(&self) -> Vec<MotionSummary> {
        self.lock_pending().clone()
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, Vec<MotionSummary>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Reporter for SummaryReporter {
    async fn render(&self, parameter_file: &Path, title: &str) -> Result<()> {
        let content = tokio::fs::read_to_string(parameter_file).await.map_err(|e| {
            DemoError::report_with_code(
                ErrorCode::REPORT_UNREADABLE,
                "cannot read realignment parameters",
                Some(parameter_file.to_path_buf()),
            )
            .with_source(e)
        })?;

        let summary = MotionSummary::parse(title, parameter_file, &content)?;
        debug!(
            "Rendered {} volumes from {}",
            summary.volumes,
            parameter_file.display()
        );
        self.lock_pending().push(summary);
        Ok(())
    }

    async fn show(&self) -> Result<()> {
        let summaries = std::mem::take(&mut *self.lock_pending());
        for summary in &summaries {
            println!("{summary}\n");
        }

        if self.wait && !summaries.is_empty() {
            self.prompt
                .wait_for_enter("Press Enter to continue...")
                .await?;
        }
        Ok(())
    }
}

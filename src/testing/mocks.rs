//! Recording collaborators
//!
//! Engines and reporters that append every call to a shared [`CallLog`], so a
//! test can assert on the exact interleaving across collaborators.

use crate::engine::{EngineConfig, EngineFactory, MotionCorrectionEngine, TransformOptions};
use crate::error::{DemoError, ErrorCode, Result};
use crate::report::Reporter;
use crate::subject::Func;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create(EngineConfig),
    Fit(Func),
    Transform(PathBuf),
    Render(PathBuf, String),
    Show,
}

#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl CallLog {
    pub fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| predicate(c)).count()
    }
}

pub struct RecordingEngineFactory {
    log: CallLog,
    fail_fit: bool,
    fail_transform: bool,
}

impl RecordingEngineFactory {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            fail_fit: false,
            fail_transform: false,
        }
    }

    pub fn failing_fit(mut self) -> Self {
        self.fail_fit = true;
        self
    }

    pub fn failing_transform(mut self) -> Self {
        self.fail_transform = true;
        self
    }
}

impl EngineFactory for RecordingEngineFactory {
    fn create(&self, config: &EngineConfig) -> Result<Box<dyn MotionCorrectionEngine>> {
        self.log.record(Call::Create(config.clone()));
        Ok(Box::new(RecordingEngine {
            log: self.log.clone(),
            fail_fit: self.fail_fit,
            fail_transform: self.fail_transform,
            sessions: 0,
        }))
    }
}

/// Engine that returns `rp_<index>.txt` under the output directory per session
struct RecordingEngine {
    log: CallLog,
    fail_fit: bool,
    fail_transform: bool,
    sessions: usize,
}

#[async_trait]
impl MotionCorrectionEngine for RecordingEngine {
    async fn fit(&mut self, func: &Func) -> Result<()> {
        self.log.record(Call::Fit(func.clone()));
        if self.fail_fit {
            return Err(DemoError::engine("fit failed"));
        }
        self.sessions = func.session_count();
        Ok(())
    }

    async fn transform(
        &mut self,
        output_dir: &Path,
        _options: TransformOptions,
    ) -> Result<Vec<PathBuf>> {
        self.log.record(Call::Transform(output_dir.to_path_buf()));
        if self.fail_transform {
            return Err(DemoError::engine("transform failed"));
        }
        Ok((0..self.sessions)
            .map(|index| output_dir.join(format!("rp_{index}.txt")))
            .collect())
    }
}

pub struct RecordingReporter {
    log: CallLog,
    fail_render: bool,
}

impl RecordingReporter {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            fail_render: false,
        }
    }

    /// Every `render` records the call, then fails as a malformed file would
    pub fn failing_render(mut self) -> Self {
        self.fail_render = true;
        self
    }
}

#[async_trait]
impl Reporter for RecordingReporter {
    async fn render(&self, parameter_file: &Path, title: &str) -> Result<()> {
        self.log
            .record(Call::Render(parameter_file.to_path_buf(), title.to_string()));
        if self.fail_render {
            return Err(DemoError::report_with_code(
                ErrorCode::REPORT_MALFORMED,
                "render failed",
                Some(parameter_file.to_path_buf()),
            ));
        }
        Ok(())
    }

    async fn show(&self) -> Result<()> {
        self.log.record(Call::Show);
        Ok(())
    }
}

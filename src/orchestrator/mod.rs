//! Per-subject fit → transform → report pipeline

use crate::engine::{EngineConfig, EngineFactory, TransformOptions};
use crate::error::Result;
use crate::report::Reporter;
use crate::subject::{SubjectData, Subjects};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Where a subject is in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectStage {
    Created,
    Fit,
    Transformed,
    Reported,
    Done,
}

impl fmt::Display for SubjectStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubjectStage::Created => "created",
            SubjectStage::Fit => "fit",
            SubjectStage::Transformed => "transformed",
            SubjectStage::Reported => "reported",
            SubjectStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Outcome of one dataset run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub label: String,
    pub subjects: usize,
    pub sessions: usize,
    pub elapsed: Duration,
}

/// Title used for each rendered session
pub fn report_title(subject_id: &str, session_index: usize, label: &str) -> String {
    format!(
        "Estimated motion for {} (session {}) of '{}'",
        subject_id, session_index, label
    )
}

pub struct DemoOrchestrator {
    engines: Arc<dyn EngineFactory>,
    reporter: Arc<dyn Reporter>,
    transform: TransformOptions,
}

impl DemoOrchestrator {
    pub fn new(engines: Arc<dyn EngineFactory>, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            engines,
            reporter,
            transform: TransformOptions::default(),
        }
    }

    /// Process every subject in order; the first error aborts the run
    pub async fn run(
        &self,
        subjects: Subjects<'_>,
        label: &str,
        config: &EngineConfig,
    ) -> Result<RunSummary> {
        let started = Instant::now();
        let mut summary = RunSummary {
            label: label.to_string(),
            subjects: 0,
            sessions: 0,
            elapsed: Duration::ZERO,
        };

        for subject in subjects {
            let subject = subject?;
            summary.sessions += self.process_subject(&subject, label, config).await?;
            summary.subjects += 1;
        }

        summary.elapsed = started.elapsed();
        info!(
            "{}: {} subject(s), {} session(s) in {:.1?}",
            label, summary.subjects, summary.sessions, summary.elapsed
        );
        Ok(summary)
    }

    async fn process_subject(
        &self,
        subject: &SubjectData,
        label: &str,
        config: &EngineConfig,
    ) -> Result<usize> {
        let id = subject.subject_id();
        debug!(subject = id, stage = %SubjectStage::Created, "Stage transition");

        let mut engine = self.engines.create(config)?;
        engine.fit(subject.func()).await?;
        debug!(subject = id, stage = %SubjectStage::Fit, "Stage transition");

        let parameter_files = engine
            .transform(subject.output_dir(), self.transform)
            .await?;
        debug!(
            subject = id,
            stage = %SubjectStage::Transformed,
            output_dir = %subject.output_dir().display(),
            "Stage transition"
        );

        for (session_index, parameter_file) in parameter_files.iter().enumerate() {
            self.reporter
                .render(parameter_file, &report_title(id, session_index, label))
                .await?;
        }
        debug!(subject = id, stage = %SubjectStage::Reported, "Stage transition");

        self.reporter.show().await?;
        debug!(subject = id, stage = %SubjectStage::Done, "Stage transition");

        Ok(parameter_files.len())
    }
}

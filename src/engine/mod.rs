//! Motion-correction engine seam
//!
//! The orchestrator drives engines only through [`EngineFactory`] and
//! [`MotionCorrectionEngine`]; the registration itself happens elsewhere.
//! [`command::CommandEngine`] delegates to an external program.

pub mod command;

pub use command::{CommandEngine, CommandEngineFactory};

use crate::error::Result;
use crate::subject::Func;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Configuration bundle handed to every engine instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Session-count hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_sessions: Option<usize>,

    /// Options the core does not interpret, passed through unchanged
    #[serde(flatten)]
    pub options: BTreeMap<String, serde_json::Value>,
}

impl EngineConfig {
    pub fn with_sessions(n_sessions: usize) -> Self {
        Self {
            n_sessions: Some(n_sessions),
            options: BTreeMap::new(),
        }
    }
}

/// Output switches for [`MotionCorrectionEngine::transform`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformOptions {
    /// Write resampled volumes
    pub reslice: bool,
    /// Write each session as one 4D series
    pub concat: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            reslice: true,
            concat: true,
        }
    }
}

#[async_trait]
pub trait MotionCorrectionEngine: Send {
    /// Estimate motion for a single series or an ordered list of sessions
    async fn fit(&mut self, func: &Func) -> Result<()>;

    /// Write realigned data under `output_dir` and return one
    /// realignment-parameter file per session, in session order
    async fn transform(
        &mut self,
        output_dir: &Path,
        options: TransformOptions,
    ) -> Result<Vec<PathBuf>>;
}

/// Builds a fresh engine for each subject
pub trait EngineFactory: Send + Sync {
    fn create(&self, config: &EngineConfig) -> Result<Box<dyn MotionCorrectionEngine>>;
}

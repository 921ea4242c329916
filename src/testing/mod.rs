//! Testing utilities and fixtures
//!
//! Recording mocks for the engine and reporter seams, sharing one call log so
//! tests can assert on the interleaving across collaborators.

pub mod mocks;

pub use mocks::{Call, CallLog, RecordingEngineFactory, RecordingReporter};

use crate::orchestrator::DemoOrchestrator;
use std::sync::Arc;

/// Test context holding the call log shared by the recording mocks
#[derive(Debug, Clone, Default)]
pub struct TestContext {
    pub log: CallLog,
}

impl TestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Orchestrator wired to recording mocks sharing this context's log
    pub fn orchestrator(&self) -> DemoOrchestrator {
        DemoOrchestrator::new(
            Arc::new(RecordingEngineFactory::new(self.log.clone())),
            Arc::new(RecordingReporter::new(self.log.clone())),
        )
    }
}

use crate::error::{DemoError, ErrorCode};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Process timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Mock expectation not met: {0}")]
    MockExpectationNotMet(String),
}

/// Subprocess failures surface as engine errors unless a caller maps them itself
impl From<ProcessError> for DemoError {
    fn from(err: ProcessError) -> Self {
        let (code, command) = match &err {
            ProcessError::CommandNotFound(cmd) => {
                (ErrorCode::ENGINE_COMMAND_NOT_FOUND, Some(cmd.clone()))
            }
            ProcessError::Timeout(_) => (ErrorCode::ENGINE_TIMEOUT, None),
            ProcessError::Io(_) | ProcessError::MockExpectationNotMet(_) => {
                (ErrorCode::ENGINE_GENERIC, None)
            }
        };

        DemoError::engine_with_code(code, err.to_string(), command).with_source(err)
    }
}

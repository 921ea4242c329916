use std::path::PathBuf;
use thiserror::Error;

pub mod codes;

pub use codes::{describe_error_code, ErrorCode};

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// The unified error type for dataset location, subject grouping and the demo pipeline
#[derive(Error, Debug)]
pub enum DemoError {
    #[error("[E{code:04}] Configuration error: {message}")]
    Config {
        code: u16,
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("[E{code:04}] Storage error: {message}")]
    Storage {
        code: u16,
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("[E{code:04}] Ambiguous subject '{subject_id}': {candidates} candidate file(s) in session {session}")]
    AmbiguousSubject {
        code: u16,
        subject_id: String,
        session: u32,
        candidates: usize,
    },

    #[error("[E{code:04}] Engine error: {message}")]
    Engine {
        code: u16,
        message: String,
        command: Option<String>,
        exit_code: Option<i32>,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("[E{code:04}] Report error: {message}")]
    Report {
        code: u16,
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("[E{code:04}] Invalid subject: {message}")]
    InvalidSubject { code: u16, message: String },
}

impl DemoError {
    /// Create a configuration error with default code
    pub fn config(message: impl Into<String>) -> Self {
        Self::config_with_code(ErrorCode::CONFIG_GENERIC, message)
    }

    /// Create a configuration error with specific code
    pub fn config_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Config {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create a storage error with default code
    pub fn storage(message: impl Into<String>) -> Self {
        Self::storage_with_code(ErrorCode::STORAGE_GENERIC, message, None)
    }

    /// Create a storage error with specific code and path
    pub fn storage_with_code(code: u16, message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Storage {
            code,
            message: message.into(),
            path,
            source: None,
        }
    }

    pub fn ambiguous_subject(subject_id: impl Into<String>, session: u32, candidates: usize) -> Self {
        Self::AmbiguousSubject {
            code: ErrorCode::SUBJECT_AMBIGUOUS,
            subject_id: subject_id.into(),
            session,
            candidates,
        }
    }

    /// Create an engine error with default code
    pub fn engine(message: impl Into<String>) -> Self {
        Self::engine_with_code(ErrorCode::ENGINE_GENERIC, message, None)
    }

    /// Create an engine error with specific code and command line
    pub fn engine_with_code(code: u16, message: impl Into<String>, command: Option<String>) -> Self {
        Self::Engine {
            code,
            message: message.into(),
            command,
            exit_code: None,
            source: None,
        }
    }

    /// Create a report error with default code
    pub fn report(message: impl Into<String>) -> Self {
        Self::report_with_code(ErrorCode::REPORT_GENERIC, message, None)
    }

    /// Create a report error with specific code and path
    pub fn report_with_code(code: u16, message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Report {
            code,
            message: message.into(),
            path,
            source: None,
        }
    }

    pub fn invalid_subject(code: u16, message: impl Into<String>) -> Self {
        Self::InvalidSubject {
            code,
            message: message.into(),
        }
    }

    /// Add a source error to this error
    pub fn with_source(mut self, source: impl Into<BoxedSource>) -> Self {
        match &mut self {
            Self::Config { source: src, .. }
            | Self::Storage { source: src, .. }
            | Self::Engine { source: src, .. }
            | Self::Report { source: src, .. } => {
                *src = Some(source.into());
            }
            Self::AmbiguousSubject { .. } | Self::InvalidSubject { .. } => {}
        }
        self
    }

    /// Set the exit code for an engine error
    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        if let Self::Engine {
            exit_code: ref mut ec,
            ..
        } = self
        {
            *ec = Some(exit_code);
        }
        self
    }

    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 2,
            _ => 1,
        }
    }

    /// Get the error code
    pub fn code(&self) -> u16 {
        match self {
            Self::Config { code, .. }
            | Self::Storage { code, .. }
            | Self::AmbiguousSubject { code, .. }
            | Self::Engine { code, .. }
            | Self::Report { code, .. }
            | Self::InvalidSubject { code, .. } => *code,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Config { message, .. } => format!("Configuration problem: {}", message),
            Self::Storage { message, path, .. } => {
                if let Some(p) = path {
                    format!("Storage error at {}: {}", p.display(), message)
                } else {
                    format!("Storage error: {}", message)
                }
            }
            Self::AmbiguousSubject {
                subject_id,
                session,
                candidates,
                ..
            } => format!(
                "Subject '{}' matched {} functional file(s) in session {}; expected exactly one",
                subject_id, candidates, session
            ),
            Self::Engine {
                message, command, ..
            } => {
                if let Some(cmd) = command {
                    format!("Motion correction command '{}' failed: {}", cmd, message)
                } else {
                    format!("Motion correction failed: {}", message)
                }
            }
            Self::Report { message, path, .. } => {
                if let Some(p) = path {
                    format!("Could not report {}: {}", p.display(), message)
                } else {
                    format!("Report error: {}", message)
                }
            }
            Self::InvalidSubject { message, .. } => format!("Invalid subject: {}", message),
        }
    }

    /// Get a developer-friendly error message with full chain
    pub fn developer_message(&self) -> String {
        let mut msg = format!("{} ({})", self, describe_error_code(self.code()));
        let mut current = std::error::Error::source(self);
        while let Some(cause) = current {
            msg.push_str(&format!("\n  caused by: {}", cause));
            current = cause.source();
        }
        msg
    }
}

/// Type alias for Results using DemoError
pub type Result<T> = std::result::Result<T, DemoError>;

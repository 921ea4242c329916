//! Per-subject processing units
//!
//! A [`SubjectData`] record is the only thing the orchestrator needs to know
//! about a dataset: who the subject is, which functional series to realign and
//! where the results go. Records are built by the factories in [`factory`]
//! and are immutable once constructed.

pub mod factory;

pub use factory::{
    from_listing, AmbiguityPolicy, GroupingOptions, MultiRunFactory, SessionTaggedFactory,
    SingleRunFactory, SubjectFactory, Subjects, WrappedSingleRunFactory, DEFAULT_SUBJECT_ID,
};

use crate::error::{DemoError, ErrorCode, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Functional input for one subject.
///
/// A single series is passed to the engine as-is; a session list keeps its
/// order, which is the session index used in reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum Func {
    Single(PathBuf),
    Sessions(Vec<PathBuf>),
}

impl Func {
    /// Series paths in session order
    pub fn series(&self) -> Vec<&Path> {
        match self {
            Func::Single(path) => vec![path.as_path()],
            Func::Sessions(paths) => paths.iter().map(PathBuf::as_path).collect(),
        }
    }

    pub fn session_count(&self) -> usize {
        match self {
            Func::Single(_) => 1,
            Func::Sessions(paths) => paths.len(),
        }
    }
}

/// One subject's processing unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SubjectData {
    subject_id: String,
    func: Func,
    output_dir: PathBuf,
}

impl SubjectData {
    /// Build a record, rejecting an empty identifier or an empty session list
    pub fn new(subject_id: impl Into<String>, func: Func, output_dir: PathBuf) -> Result<Self> {
        let subject_id = subject_id.into();
        if subject_id.trim().is_empty() {
            return Err(DemoError::invalid_subject(
                ErrorCode::SUBJECT_EMPTY_ID,
                "subject identifier must not be empty",
            ));
        }
        if let Func::Sessions(paths) = &func {
            if paths.is_empty() {
                return Err(DemoError::invalid_subject(
                    ErrorCode::SUBJECT_EMPTY_FUNC,
                    format!("subject '{}' has an empty session list", subject_id),
                ));
            }
        }

        Ok(Self {
            subject_id,
            func,
            output_dir,
        })
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    pub fn func(&self) -> &Func {
        &self.func
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

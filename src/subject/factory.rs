//! Subject grouping per dataset layout
//!
//! Every factory is a pure function of the raw listing it was built from:
//! calling [`SubjectFactory::subjects`] twice re-derives the same records
//! without carrying anything over between calls.

use super::{Func, SubjectData};
use crate::dataset::DatasetListing;
use crate::error::{DemoError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Identifier used by the single-subject datasets
pub const DEFAULT_SUBJECT_ID: &str = "sub001";

/// Lazily evaluated, finite sequence of subject records
pub type Subjects<'a> = Box<dyn Iterator<Item = Result<SubjectData>> + Send + 'a>;

/// Produces the subject records for one dataset
pub trait SubjectFactory: Send + Sync {
    /// Derive a fresh sequence of records from the raw listing
    fn subjects(&self) -> Subjects<'_>;
}

/// What to do when a subject does not map to exactly one functional file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmbiguityPolicy {
    /// Abort the sequence with an ambiguous-subject error
    #[default]
    Fail,
    /// Log a warning and leave the subject out
    Skip,
}

impl std::str::FromStr for AmbiguityPolicy {
    type Err = DemoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "skip" => Ok(Self::Skip),
            other => Err(DemoError::config(format!(
                "unknown ambiguity policy '{}' (expected 'fail' or 'skip')",
                other
            ))),
        }
    }
}

/// Knobs for the session-tagged grouping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupingOptions {
    /// Session to select, 1-based as in the `session<N>` directory names
    pub session: u32,
    /// Which ancestor directory of a functional file names the subject
    pub subject_level: usize,
    pub ambiguity: AmbiguityPolicy,
}

impl Default for GroupingOptions {
    fn default() -> Self {
        Self {
            session: 1,
            subject_level: 2,
            ambiguity: AmbiguityPolicy::Fail,
        }
    }
}

/// Directory tag for a session index
pub fn session_marker(session: u32) -> String {
    format!("session{}", session)
}

/// Name of the ancestor directory `level` steps above `path`
fn subject_id_at(path: &Path, level: usize) -> Option<String> {
    path.ancestors()
        .nth(level)
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
}

/// Flat listing of functional files with the session encoded in the path
#[derive(Debug, Clone)]
pub struct SessionTaggedFactory {
    func: Vec<PathBuf>,
    output_dir: PathBuf,
    options: GroupingOptions,
}

impl SessionTaggedFactory {
    pub fn new(func: Vec<PathBuf>, output_dir: impl Into<PathBuf>, options: GroupingOptions) -> Self {
        Self {
            func,
            output_dir: output_dir.into(),
            options,
        }
    }
}

impl SubjectFactory for SessionTaggedFactory {
    fn subjects(&self) -> Subjects<'_> {
        let marker = session_marker(self.options.session);
        let session_func: Vec<&PathBuf> = self
            .func
            .iter()
            .filter(|path| path.to_string_lossy().contains(&marker))
            .collect();

        let subject_ids: BTreeSet<String> = session_func
            .iter()
            .filter_map(|path| {
                let id = subject_id_at(path, self.options.subject_level);
                if id.is_none() {
                    warn!(
                        "No subject directory {} level(s) above {}; skipping",
                        self.options.subject_level,
                        path.display()
                    );
                }
                id
            })
            .collect();

        debug!(
            "{} functional file(s) and {} subject(s) in {}",
            session_func.len(),
            subject_ids.len(),
            marker
        );

        let session = self.options.session;
        let ambiguity = self.options.ambiguity;
        let session_dir = self.output_dir.join(&marker);

        Box::new(subject_ids.into_iter().filter_map(move |subject_id| {
            let matches: Vec<&PathBuf> = session_func
                .iter()
                .copied()
                .filter(|path| path.to_string_lossy().contains(subject_id.as_str()))
                .collect();

            match (matches.as_slice(), ambiguity) {
                ([func], _) => {
                    let output_dir = session_dir.join(&subject_id);
                    Some(SubjectData::new(
                        subject_id,
                        Func::Single(func.to_path_buf()),
                        output_dir,
                    ))
                }
                (_, AmbiguityPolicy::Fail) => Some(Err(DemoError::ambiguous_subject(
                    subject_id,
                    session,
                    matches.len(),
                ))),
                (_, AmbiguityPolicy::Skip) => {
                    warn!(
                        "Skipping subject '{}': {} candidate file(s) in session {}",
                        subject_id,
                        matches.len(),
                        session
                    );
                    None
                }
            }
        }))
    }
}

/// Single subject with one functional series
#[derive(Debug, Clone)]
pub struct SingleRunFactory {
    func: PathBuf,
    output_dir: PathBuf,
}

impl SingleRunFactory {
    pub fn new(func: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            func: func.into(),
            output_dir: output_dir.into(),
        }
    }
}

impl SubjectFactory for SingleRunFactory {
    fn subjects(&self) -> Subjects<'_> {
        Box::new(std::iter::once(SubjectData::new(
            DEFAULT_SUBJECT_ID,
            Func::Single(self.func.clone()),
            self.output_dir.join(DEFAULT_SUBJECT_ID),
        )))
    }
}

/// Single subject with several functional runs, one session each
#[derive(Debug, Clone)]
pub struct MultiRunFactory {
    runs: Vec<PathBuf>,
    output_dir: PathBuf,
}

impl MultiRunFactory {
    pub fn new(runs: Vec<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            runs,
            output_dir: output_dir.into(),
        }
    }

    pub fn session_count(&self) -> usize {
        self.runs.len()
    }
}

impl SubjectFactory for MultiRunFactory {
    fn subjects(&self) -> Subjects<'_> {
        Box::new(std::iter::once(SubjectData::new(
            DEFAULT_SUBJECT_ID,
            Func::Sessions(self.runs.clone()),
            self.output_dir.join(DEFAULT_SUBJECT_ID),
        )))
    }
}

/// Single subject with one series, passed on as a one-session list
#[derive(Debug, Clone)]
pub struct WrappedSingleRunFactory {
    func: PathBuf,
    output_dir: PathBuf,
}

impl WrappedSingleRunFactory {
    pub fn new(func: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            func: func.into(),
            output_dir: output_dir.into(),
        }
    }
}

impl SubjectFactory for WrappedSingleRunFactory {
    fn subjects(&self) -> Subjects<'_> {
        Box::new(std::iter::once(SubjectData::new(
            DEFAULT_SUBJECT_ID,
            Func::Sessions(vec![self.func.clone()]),
            self.output_dir.join(DEFAULT_SUBJECT_ID),
        )))
    }
}

/// Pick the grouping rule for a dataset's raw listing
pub fn from_listing(
    listing: DatasetListing,
    output_dir: &Path,
    options: &GroupingOptions,
) -> Box<dyn SubjectFactory> {
    match listing {
        DatasetListing::NyuRest { func } => Box::new(SessionTaggedFactory::new(
            func,
            output_dir,
            options.clone(),
        )),
        DatasetListing::FslFeeds { func } => Box::new(SingleRunFactory::new(func, output_dir)),
        DatasetListing::SpmMultimodal { func1, func2 } => {
            Box::new(MultiRunFactory::new(vec![func1, func2], output_dir))
        }
        DatasetListing::SpmAuditory { func } => {
            Box::new(WrappedSingleRunFactory::new(func, output_dir))
        }
    }
}

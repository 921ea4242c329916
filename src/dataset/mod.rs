//! Dataset identifiers, raw listings and the demo registry
//!
//! - `locator` - Resolve a dataset in a local cache, delegating downloads to an external command

pub mod locator;

pub use locator::{CacheLocator, DatasetLocator};

use crate::error::{DemoError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// The public datasets the demos know how to group
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum DatasetId {
    NyuRest,
    FslFeeds,
    SpmMultimodal,
    SpmAuditory,
}

impl DatasetId {
    /// Order in which `run_all` processes the datasets
    pub const RUN_ORDER: [DatasetId; 4] = [
        DatasetId::SpmAuditory,
        DatasetId::SpmMultimodal,
        DatasetId::FslFeeds,
        DatasetId::NyuRest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetId::NyuRest => "nyu-rest",
            DatasetId::FslFeeds => "fsl-feeds",
            DatasetId::SpmMultimodal => "spm-multimodal",
            DatasetId::SpmAuditory => "spm-auditory",
        }
    }

    pub fn spec(&self) -> &'static DatasetSpec {
        match self {
            DatasetId::SpmAuditory => &DATASETS[0],
            DatasetId::SpmMultimodal => &DATASETS[1],
            DatasetId::FslFeeds => &DATASETS[2],
            DatasetId::NyuRest => &DATASETS[3],
        }
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetId {
    type Err = DemoError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        DATASETS
            .iter()
            .map(|spec| spec.id)
            .find(|id| id.as_str() == normalized)
            .ok_or_else(|| DemoError::config(format!("unknown dataset '{}'", s)))
    }
}

/// Static description of one demo dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSpec {
    pub id: DatasetId,
    /// Human-readable label used in log lines and report titles
    pub label: &'static str,
    pub default_data_dir: &'static str,
    pub default_output_dir: &'static str,
    /// Session-count hint forwarded to the engine
    pub n_sessions: Option<usize>,
}

/// Registry of the known datasets, in run order
pub static DATASETS: [DatasetSpec; 4] = [
    DatasetSpec {
        id: DatasetId::SpmAuditory,
        label: "SPM single-subject Auditory",
        default_data_dir: "/tmp/spm_auditory_data",
        default_output_dir: "/tmp/spm_auditory_output",
        n_sessions: None,
    },
    DatasetSpec {
        id: DatasetId::SpmMultimodal,
        label: "SPM Multimodal fMRI faces vs scrambled",
        default_data_dir: "/tmp/spm_multimodal_fmri",
        default_output_dir: "/tmp/spm_multimodal_fmri_output",
        n_sessions: Some(2),
    },
    DatasetSpec {
        id: DatasetId::FslFeeds,
        label: "FSL FEEDS",
        default_data_dir: "/tmp/fsl-feeds-data",
        default_output_dir: "/tmp/fsl_feeds_mrimc_output",
        n_sessions: None,
    },
    DatasetSpec {
        id: DatasetId::NyuRest,
        label: "NYU resting state",
        default_data_dir: "/tmp/nyu_data",
        default_output_dir: "/tmp/nyu_mrimc_output",
        n_sessions: None,
    },
];

/// Raw functional file listing, shaped the way each dataset is published
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetListing {
    /// Every subject and session; the session is tagged in the path
    NyuRest { func: Vec<PathBuf> },
    FslFeeds { func: PathBuf },
    /// Two runs of the same subject
    SpmMultimodal { func1: PathBuf, func2: PathBuf },
    SpmAuditory { func: PathBuf },
}

impl DatasetListing {
    pub fn dataset(&self) -> DatasetId {
        match self {
            DatasetListing::NyuRest { .. } => DatasetId::NyuRest,
            DatasetListing::FslFeeds { .. } => DatasetId::FslFeeds,
            DatasetListing::SpmMultimodal { .. } => DatasetId::SpmMultimodal,
            DatasetListing::SpmAuditory { .. } => DatasetId::SpmAuditory,
        }
    }

    /// Number of functional paths in the listing
    pub fn file_count(&self) -> usize {
        match self {
            DatasetListing::NyuRest { func } => func.len(),
            DatasetListing::SpmMultimodal { .. } => 2,
            DatasetListing::FslFeeds { .. } | DatasetListing::SpmAuditory { .. } => 1,
        }
    }

    /// Session indices tagged in a session-tagged listing
    pub fn tagged_sessions(&self) -> BTreeSet<u32> {
        match self {
            DatasetListing::NyuRest { func } => func
                .iter()
                .flat_map(|path| {
                    SESSION_TAG
                        .captures_iter(&path.to_string_lossy())
                        .filter_map(|caps| caps[1].parse::<u32>().ok())
                        .collect::<Vec<_>>()
                })
                .collect(),
            _ => BTreeSet::new(),
        }
    }
}

static SESSION_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"session(\d+)").expect("session tag pattern is valid"));

//! Configuration for the demos
//!
//! Settings come from, in increasing precedence: built-in defaults, a TOML
//! file (`-c <file>` or the platform config directory), and `REALIGN_*`
//! environment variables.

pub mod loader;

pub use loader::{default_config_path, ConfigLoader};

use crate::dataset::DatasetId;
use crate::engine::EngineConfig;
use crate::error::{DemoError, ErrorCode, Result};
use crate::subject::{AmbiguityPolicy, GroupingOptions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Default program invoked by the command engine
pub const DEFAULT_ENGINE_PROGRAM: &str = "realign";

/// Engine option keys that collide with flags the command engine sets itself
const RESERVED_ENGINE_OPTIONS: &[&str] = &[
    "n_sessions",
    "n-sessions",
    "output_dir",
    "output-dir",
    "reslice",
    "concat",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemoConfig {
    #[serde(default)]
    pub engine: EngineSettings,

    /// External command that downloads a missing dataset
    #[serde(default)]
    pub fetch: Option<FetchConfig>,

    #[serde(default)]
    pub display: DisplaySettings,

    #[serde(default)]
    pub grouping: GroupingSettings,

    /// Per-dataset directory overrides keyed by dataset id (e.g. `nyu-rest`)
    #[serde(default)]
    pub datasets: BTreeMap<String, DatasetOverride>,
}

/// How the motion-correction command is run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default = "default_engine_program")]
    pub program: String,

    /// Arguments placed before the generated ones
    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,

    /// Extra engine options, forwarded verbatim
    #[serde(default)]
    pub options: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchConfig {
    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySettings {
    /// Block after each subject until the user presses Enter
    #[serde(default = "default_true")]
    pub wait: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingSettings {
    #[serde(default)]
    pub ambiguity: AmbiguityPolicy,

    /// Session processed for session-tagged datasets
    #[serde(default = "default_session")]
    pub session: u32,

    /// Ancestor level of a functional file that names its subject
    #[serde(default = "default_subject_level")]
    pub subject_level: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetOverride {
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

fn default_engine_program() -> String {
    DEFAULT_ENGINE_PROGRAM.to_string()
}

fn default_true() -> bool {
    true
}

fn default_session() -> u32 {
    1
}

fn default_subject_level() -> usize {
    2
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            program: default_engine_program(),
            args: Vec::new(),
            timeout: None,
            options: BTreeMap::new(),
        }
    }
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self { wait: true }
    }
}

impl Default for GroupingSettings {
    fn default() -> Self {
        Self {
            ambiguity: AmbiguityPolicy::default(),
            session: default_session(),
            subject_level: default_subject_level(),
        }
    }
}

impl GroupingSettings {
    pub fn options(&self) -> GroupingOptions {
        GroupingOptions {
            session: self.session,
            subject_level: self.subject_level,
            ambiguity: self.ambiguity,
        }
    }
}

impl EngineSettings {
    /// Configuration bundle for one dataset's engines
    pub fn bundle(&self, n_sessions: Option<usize>) -> EngineConfig {
        EngineConfig {
            n_sessions,
            options: self.options.clone(),
        }
    }
}

impl DemoConfig {
    /// Apply `REALIGN_*` overrides from the process environment
    pub fn merge_env_vars(&mut self) -> Result<()> {
        self.merge_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn merge_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(engine) = lookup("REALIGN_ENGINE") {
            let (program, args) = split_command("REALIGN_ENGINE", &engine)?;
            self.engine.program = program;
            self.engine.args = args;
        }

        if let Some(fetch) = lookup("REALIGN_FETCH_COMMAND") {
            let (program, args) = split_command("REALIGN_FETCH_COMMAND", &fetch)?;
            let timeout = self.fetch.as_ref().and_then(|f| f.timeout);
            self.fetch = Some(FetchConfig {
                program,
                args,
                timeout,
            });
        }

        if let Some(no_wait) = lookup("REALIGN_NO_WAIT") {
            let no_wait = parse_bool("REALIGN_NO_WAIT", &no_wait)?;
            self.display.wait = !no_wait;
        }

        if let Some(ambiguity) = lookup("REALIGN_AMBIGUITY") {
            self.grouping.ambiguity = ambiguity.parse()?;
        }

        if let Some(session) = lookup("REALIGN_SESSION") {
            self.grouping.session = session.trim().parse().map_err(|_| {
                DemoError::config_with_code(
                    ErrorCode::CONFIG_INVALID_VALUE,
                    format!("REALIGN_SESSION must be a positive integer, got '{}'", session),
                )
            })?;
        }

        Ok(())
    }

    /// Reject values the demos cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.engine.program.trim().is_empty() {
            return Err(DemoError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                "engine.program must not be empty",
            ));
        }
        if let Some(key) = self
            .engine
            .options
            .keys()
            .find(|key| RESERVED_ENGINE_OPTIONS.contains(&key.as_str()))
        {
            return Err(DemoError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                format!("engine.options.{} is set by the demos and cannot be overridden", key),
            ));
        }
        if let Some(fetch) = &self.fetch {
            if fetch.program.trim().is_empty() {
                return Err(DemoError::config_with_code(
                    ErrorCode::CONFIG_INVALID_VALUE,
                    "fetch.program must not be empty",
                ));
            }
        }
        if self.grouping.session == 0 {
            return Err(DemoError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                "grouping.session is 1-based",
            ));
        }
        if self.grouping.subject_level == 0 {
            return Err(DemoError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                "grouping.subject_level must be at least 1",
            ));
        }
        for key in self.datasets.keys() {
            key.parse::<DatasetId>()?;
        }
        Ok(())
    }

    /// Directory override for a dataset, if any
    pub fn dataset_override(&self, dataset: DatasetId) -> Option<&DatasetOverride> {
        self.datasets.get(dataset.as_str())
    }
}

fn split_command(var: &str, value: &str) -> Result<(String, Vec<String>)> {
    let mut words = shell_words::split(value).map_err(|e| {
        DemoError::config_with_code(
            ErrorCode::CONFIG_PARSE_ERROR,
            format!("{} is not a valid command line", var),
        )
        .with_source(e)
    })?;
    if words.is_empty() {
        return Err(DemoError::config_with_code(
            ErrorCode::CONFIG_INVALID_VALUE,
            format!("{} must name a program", var),
        ));
    }
    let program = words.remove(0);
    Ok((program, words))
}

fn parse_bool(var: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(DemoError::config_with_code(
            ErrorCode::CONFIG_INVALID_VALUE,
            format!("{} must be a boolean, got '{}'", var, value),
        )),
    }
}

//! Engine backed by an external realignment program
//!
//! `transform` runs
//! `<program> <args...> --output-dir <dir> [--reslice] [--concat] [--n-sessions N] [--<option> <value>]... -- <series...>`
//! and expects one realignment-parameter path per stdout line, in session order.

use super::{EngineConfig, EngineFactory, MotionCorrectionEngine, TransformOptions};
use crate::config::EngineSettings;
use crate::error::{DemoError, ErrorCode, Result};
use crate::subject::Func;
use crate::subprocess::{ProcessCommandBuilder, ProcessOutput, ProcessRunner, SubprocessManager};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

pub struct CommandEngineFactory {
    subprocess: SubprocessManager,
    settings: EngineSettings,
}

impl CommandEngineFactory {
    pub fn new(subprocess: SubprocessManager, settings: EngineSettings) -> Self {
        Self {
            subprocess,
            settings,
        }
    }
}

impl EngineFactory for CommandEngineFactory {
    fn create(&self, config: &EngineConfig) -> Result<Box<dyn MotionCorrectionEngine>> {
        Ok(Box::new(CommandEngine {
            runner: self.subprocess.runner(),
            program: self.settings.program.clone(),
            args: self.settings.args.clone(),
            timeout: self.settings.timeout,
            config: config.clone(),
            sessions: None,
        }))
    }
}

pub struct CommandEngine {
    runner: Arc<dyn ProcessRunner>,
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
    config: EngineConfig,
    sessions: Option<Vec<PathBuf>>,
}

impl CommandEngine {
    fn option_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        for (key, value) in &self.config.options {
            match value {
                serde_json::Value::Bool(true) => args.push(format!("--{}", key)),
                serde_json::Value::Bool(false) | serde_json::Value::Null => {}
                serde_json::Value::String(s) => {
                    args.push(format!("--{}", key));
                    args.push(s.clone());
                }
                other => {
                    args.push(format!("--{}", key));
                    args.push(other.to_string());
                }
            }
        }
        args
    }

    /// Relative paths are resolved against the output directory
    fn parse_parameter_files(output: &ProcessOutput, output_dir: &Path) -> Vec<PathBuf> {
        output
            .stdout_lines()
            .map(|line| {
                let path = PathBuf::from(line);
                if path.is_absolute() {
                    path
                } else {
                    output_dir.join(path)
                }
            })
            .collect()
    }
}

#[async_trait]
impl MotionCorrectionEngine for CommandEngine {
    async fn fit(&mut self, func: &Func) -> Result<()> {
        let series: Vec<PathBuf> = func.series().into_iter().map(Path::to_path_buf).collect();

        for path in &series {
            if !path.exists() {
                return Err(DemoError::engine_with_code(
                    ErrorCode::ENGINE_INVALID_INPUT,
                    format!("functional series {} does not exist", path.display()),
                    None,
                ));
            }
        }

        if let Some(expected) = self.config.n_sessions {
            if expected != series.len() {
                return Err(DemoError::engine_with_code(
                    ErrorCode::ENGINE_INVALID_INPUT,
                    format!(
                        "engine configured for {} session(s) but got {}",
                        expected,
                        series.len()
                    ),
                    None,
                ));
            }
        }

        debug!("Fitted {} session(s)", series.len());
        self.sessions = Some(series);
        Ok(())
    }

    async fn transform(
        &mut self,
        output_dir: &Path,
        options: TransformOptions,
    ) -> Result<Vec<PathBuf>> {
        let sessions = self.sessions.as_ref().ok_or_else(|| {
            DemoError::engine_with_code(
                ErrorCode::ENGINE_NOT_FITTED,
                "transform called before fit",
                None,
            )
        })?;

        tokio::fs::create_dir_all(output_dir).await.map_err(|e| {
            DemoError::engine(format!("cannot create {}", output_dir.display())).with_source(e)
        })?;

        let mut builder = ProcessCommandBuilder::new(&self.program)
            .args(&self.args)
            .arg("--output-dir")
            .path_arg(output_dir)
            .timeout(self.timeout);
        if options.reslice {
            builder = builder.arg("--reslice");
        }
        if options.concat {
            builder = builder.arg("--concat");
        }
        if let Some(n) = self.config.n_sessions {
            builder = builder.arg("--n-sessions").arg(&n.to_string());
        }
        builder = builder.args(self.option_args()).arg("--");
        for series in sessions {
            builder = builder.path_arg(series);
        }
        let command = builder.build();
        let command_line = command.display();

        let output = self.runner.run(command).await?;
        trace!("Engine stdout: {}", output.stdout);

        if !output.status.success() {
            let mut error = DemoError::engine_with_code(
                ErrorCode::ENGINE_SUBPROCESS_FAILED,
                format!("exited with {:?}: {}", output.status, output.stderr.trim()),
                Some(command_line),
            );
            if let Some(code) = output.status.code() {
                error = error.with_exit_code(code);
            }
            return Err(error);
        }

        let parameter_files = Self::parse_parameter_files(&output, output_dir);
        if parameter_files.len() != sessions.len() {
            return Err(DemoError::engine_with_code(
                ErrorCode::ENGINE_OUTPUT_ERROR,
                format!(
                    "expected {} realignment parameter file(s), got {}",
                    sessions.len(),
                    parameter_files.len()
                ),
                Some(command_line),
            ));
        }

        Ok(parameter_files)
    }
}

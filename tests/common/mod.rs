//! Common test utilities and helpers

#![allow(dead_code)]

use anyhow::Result;
use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Shell engine that writes one realignment-parameter file per series and
/// prints its name, mimicking the command-engine protocol
pub const ENGINE_SCRIPT: &str = r#"#!/bin/sh
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    --output-dir) out="$2"; shift 2 ;;
    --) shift; break ;;
    *) shift ;;
  esac
done
for series in "$@"; do
  name="rp_$(basename "$series" | sed 's/\..*$//').txt"
  printf '0 0 0 0 0 0\n0.1 -0.2 0.3 0.001 0.002 -0.003\n' > "$out/$name"
  echo "$name"
done
"#;

/// Builds a throwaway dataset cache, output directory and config file
pub struct TestCacheBuilder {
    temp_dir: TempDir,
    files: Vec<PathBuf>,
    dirs: Vec<PathBuf>,
    config: Option<String>,
    engine_script: bool,
}

pub struct TestCache {
    pub temp_dir: TempDir,
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub config_path: Option<PathBuf>,
    pub engine_path: Option<PathBuf>,
}

impl TestCacheBuilder {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
            files: Vec::new(),
            dirs: Vec::new(),
            config: None,
            engine_script: false,
        })
    }

    /// Cached file relative to the data directory
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.files.push(path.as_ref().to_path_buf());
        self
    }

    /// Cached directory relative to the data directory
    pub fn with_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.dirs.push(path.as_ref().to_path_buf());
        self
    }

    pub fn with_fsl_feeds(self) -> Self {
        self.with_file("fsl_feeds/data/fmri.nii.gz")
    }

    pub fn with_spm_multimodal(self) -> Self {
        self.with_dir("spm_multimodal_fmri/fMRI/Session1")
            .with_dir("spm_multimodal_fmri/fMRI/Session2")
    }

    pub fn with_nyu_subject(self, session: u32, subject: &str) -> Self {
        self.with_file(format!("nyu_rest/session{session}/{subject}/func/lfo.nii.gz"))
    }

    /// Raw TOML for `config.toml`; `{engine}` is replaced by the script path
    pub fn with_config(mut self, toml: &str) -> Self {
        self.config = Some(toml.to_string());
        self
    }

    pub fn with_engine_script(mut self) -> Self {
        self.engine_script = true;
        self
    }

    pub fn build(self) -> Result<TestCache> {
        let root = self.temp_dir.path();
        let data_dir = root.join("data");
        let output_dir = root.join("output");
        fs::create_dir_all(&data_dir)?;

        for file in &self.files {
            let path = data_dir.join(file);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, b"")?;
        }
        for dir in &self.dirs {
            fs::create_dir_all(data_dir.join(dir))?;
        }

        let engine_path = if self.engine_script {
            let path = root.join("fake-realign.sh");
            fs::write(&path, ENGINE_SCRIPT)?;
            make_executable(&path)?;
            Some(path)
        } else {
            None
        };

        let config_path = match self.config {
            Some(toml) => {
                let engine = engine_path
                    .as_ref()
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let path = root.join("config.toml");
                fs::write(&path, toml.replace("{engine}", &engine))?;
                Some(path)
            }
            None => None,
        };

        Ok(TestCache {
            temp_dir: self.temp_dir,
            data_dir,
            output_dir,
            config_path,
            engine_path,
        })
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(path, permissions)?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// The binary with user config and `REALIGN_*` variables isolated
pub fn cli(scratch: &Path) -> Command {
    let mut cmd = Command::cargo_bin("realign-demos").unwrap();
    cmd.env("XDG_CONFIG_HOME", scratch.join("xdg"))
        .env("HOME", scratch)
        .env_remove("RUST_LOG")
        .env_remove("REALIGN_ENGINE")
        .env_remove("REALIGN_FETCH_COMMAND")
        .env_remove("REALIGN_NO_WAIT")
        .env_remove("REALIGN_AMBIGUITY")
        .env_remove("REALIGN_SESSION");
    cmd
}

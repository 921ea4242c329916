//! Dataset lookup in a local cache directory
//!
//! The cache layout mirrors what the public dataset fetchers produce. When a
//! dataset is missing and a fetch command is configured, the download is
//! delegated to that command and the cache is scanned once more.

use super::{DatasetId, DatasetListing};
use crate::config::FetchConfig;
use crate::error::{DemoError, ErrorCode, Result};
use crate::subprocess::{ProcessCommandBuilder, SubprocessManager};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Resolves a dataset into its raw functional file listing
#[async_trait]
pub trait DatasetLocator: Send + Sync {
    async fn locate(&self, dataset: DatasetId, data_dir: &Path) -> Result<DatasetListing>;
}

/// Locator backed by a directory on disk
pub struct CacheLocator {
    subprocess: SubprocessManager,
    fetch: Option<FetchConfig>,
}

impl CacheLocator {
    pub fn new(subprocess: SubprocessManager, fetch: Option<FetchConfig>) -> Self {
        Self { subprocess, fetch }
    }

    /// Locator that only reads what is already cached
    pub fn offline() -> Self {
        Self::new(SubprocessManager::production(), None)
    }

    fn ensure_dir(data_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(data_dir).map_err(|e| {
            let code = if e.kind() == std::io::ErrorKind::PermissionDenied {
                ErrorCode::STORAGE_PERMISSION_DENIED
            } else {
                ErrorCode::STORAGE_IO_ERROR
            };
            DemoError::storage_with_code(
                code,
                "cannot create dataset directory",
                Some(data_dir.to_path_buf()),
            )
            .with_source(e)
        })
    }

    /// A fetch needs to write into `data_dir`; reading a complete cache does not
    fn ensure_writable(data_dir: &Path) -> Result<()> {
        let denied = |source: Option<std::io::Error>| {
            let error = DemoError::storage_with_code(
                ErrorCode::STORAGE_PERMISSION_DENIED,
                "dataset directory is not writable",
                Some(data_dir.to_path_buf()),
            );
            match source {
                Some(e) => error.with_source(e),
                None => error,
            }
        };

        let metadata = std::fs::metadata(data_dir).map_err(|e| denied(Some(e)))?;
        if metadata.permissions().readonly() {
            return Err(denied(None));
        }

        let marker = data_dir.join(".realign-write-check");
        std::fs::write(&marker, b"").map_err(|e| denied(Some(e)))?;
        if let Err(e) = std::fs::remove_file(&marker) {
            warn!("Cannot remove {}: {}", marker.display(), e);
        }
        Ok(())
    }

    /// Scan the cache for a dataset, `None` when any required file is missing
    pub fn scan(dataset: DatasetId, data_dir: &Path) -> Result<Option<DatasetListing>> {
        let listing = match dataset {
            DatasetId::NyuRest => {
                let func = glob_sorted(data_dir, "nyu_rest/session*/*/func/*.nii*")?;
                (!func.is_empty()).then_some(DatasetListing::NyuRest { func })
            }
            DatasetId::FslFeeds => glob_sorted(data_dir, "fsl_feeds/data/fmri.nii*")?
                .into_iter()
                .next()
                .map(|func| DatasetListing::FslFeeds { func }),
            DatasetId::SpmMultimodal => {
                let root = data_dir.join("spm_multimodal_fmri").join("fMRI");
                let func1 = root.join("Session1");
                let func2 = root.join("Session2");
                (func1.is_dir() && func2.is_dir())
                    .then_some(DatasetListing::SpmMultimodal { func1, func2 })
            }
            DatasetId::SpmAuditory => {
                let func = data_dir
                    .join("spm_auditory")
                    .join("MoAEpilot")
                    .join("fM00223");
                func.is_dir()
                    .then_some(DatasetListing::SpmAuditory { func })
            }
        };
        Ok(listing)
    }

    async fn run_fetch(
        &self,
        fetch: &FetchConfig,
        dataset: DatasetId,
        data_dir: &Path,
    ) -> Result<()> {
        let command = ProcessCommandBuilder::new(&fetch.program)
            .args(&fetch.args)
            .arg(dataset.as_str())
            .path_arg(data_dir)
            .env("REALIGN_DATASET", dataset.as_str())
            .timeout(fetch.timeout)
            .build();
        let command_line = command.display();

        info!("Fetching {} into {}", dataset, data_dir.display());
        let output = self.subprocess.runner().run(command).await.map_err(|e| {
            DemoError::storage_with_code(
                ErrorCode::STORAGE_FETCH_FAILED,
                format!("fetch command '{}' could not run", command_line),
                Some(data_dir.to_path_buf()),
            )
            .with_source(e)
        })?;

        if !output.status.success() {
            let stderr = output.stderr.trim();
            return Err(DemoError::storage_with_code(
                ErrorCode::STORAGE_FETCH_FAILED,
                format!(
                    "fetch command '{}' exited with {:?}{}",
                    command_line,
                    output.status,
                    if stderr.is_empty() {
                        String::new()
                    } else {
                        format!(": {}", stderr)
                    }
                ),
                Some(data_dir.to_path_buf()),
            ));
        }

        debug!("Fetch finished in {:?}", output.duration);
        Ok(())
    }
}

#[async_trait]
impl DatasetLocator for CacheLocator {
    async fn locate(&self, dataset: DatasetId, data_dir: &Path) -> Result<DatasetListing> {
        Self::ensure_dir(data_dir)?;

        if let Some(listing) = Self::scan(dataset, data_dir)? {
            debug!(
                "Found {} in cache ({} functional path(s))",
                dataset,
                listing.file_count()
            );
            return Ok(listing);
        }

        let Some(fetch) = &self.fetch else {
            return Err(DemoError::storage_with_code(
                ErrorCode::STORAGE_NOT_FOUND,
                format!(
                    "dataset '{}' not found in cache and no fetch command is configured",
                    dataset
                ),
                Some(data_dir.to_path_buf()),
            ));
        };

        Self::ensure_writable(data_dir)?;
        self.run_fetch(fetch, dataset, data_dir).await?;

        Self::scan(dataset, data_dir)?.ok_or_else(|| {
            warn!("Fetch for {} left the cache incomplete", dataset);
            DemoError::storage_with_code(
                ErrorCode::STORAGE_NOT_FOUND,
                format!("dataset '{}' still missing after fetch", dataset),
                Some(data_dir.to_path_buf()),
            )
        })
    }
}

/// Glob relative to `base`, sorted for a stable listing
fn glob_sorted(base: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full = format!(
        "{}/{}",
        glob::Pattern::escape(&base.to_string_lossy()),
        pattern
    );
    let entries = glob::glob(&full).map_err(|e| {
        DemoError::storage(format!("invalid cache pattern '{}'", full)).with_source(e)
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| {
            DemoError::storage_with_code(
                ErrorCode::STORAGE_IO_ERROR,
                "cannot read dataset cache",
                Some(e.path().to_path_buf()),
            )
            .with_source(e.into_error())
        })?;
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    fn nyu_cache(root: &Path) {
        for (session, subject) in [(1, "sub05676"), (1, "sub08224"), (2, "sub05676")] {
            touch(
                &root
                    .join("nyu_rest")
                    .join(format!("session{session}"))
                    .join(subject)
                    .join("func")
                    .join("lfo.nii.gz"),
            );
        }
    }

    #[tokio::test]
    async fn test_locate_nyu_from_cache() {
        let temp = TempDir::new().unwrap();
        nyu_cache(temp.path());

        let listing = CacheLocator::offline()
            .locate(DatasetId::NyuRest, temp.path())
            .await
            .unwrap();

        match listing {
            DatasetListing::NyuRest { func } => {
                assert_eq!(func.len(), 3);
                assert!(func[0].ends_with("session1/sub05676/func/lfo.nii.gz"));
            }
            other => panic!("unexpected listing: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_locate_single_subject_datasets() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("fsl_feeds/data/fmri.nii.gz"));
        fs::create_dir_all(temp.path().join("spm_multimodal_fmri/fMRI/Session1")).unwrap();
        fs::create_dir_all(temp.path().join("spm_multimodal_fmri/fMRI/Session2")).unwrap();
        fs::create_dir_all(temp.path().join("spm_auditory/MoAEpilot/fM00223")).unwrap();

        let locator = CacheLocator::offline();
        assert_eq!(
            locator.locate(DatasetId::FslFeeds, temp.path()).await.unwrap(),
            DatasetListing::FslFeeds {
                func: temp.path().join("fsl_feeds/data/fmri.nii.gz")
            }
        );
        assert_eq!(
            locator
                .locate(DatasetId::SpmMultimodal, temp.path())
                .await
                .unwrap(),
            DatasetListing::SpmMultimodal {
                func1: temp.path().join("spm_multimodal_fmri/fMRI/Session1"),
                func2: temp.path().join("spm_multimodal_fmri/fMRI/Session2"),
            }
        );
        assert_eq!(
            locator
                .locate(DatasetId::SpmAuditory, temp.path())
                .await
                .unwrap()
                .dataset(),
            DatasetId::SpmAuditory
        );
    }

    #[tokio::test]
    async fn test_cache_miss_without_fetch_is_storage_error() {
        let temp = TempDir::new().unwrap();
        let data_dir = temp.path().join("fresh");

        let err = CacheLocator::offline()
            .locate(DatasetId::FslFeeds, &data_dir)
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::STORAGE_NOT_FOUND);
        assert!(data_dir.is_dir(), "data dir is created before lookup");
    }

    #[tokio::test]
    async fn test_uncreatable_data_dir_is_storage_error() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("a-file");
        fs::write(&blocker, b"x").unwrap();

        let err = CacheLocator::offline()
            .locate(DatasetId::NyuRest, &blocker.join("nested"))
            .await
            .unwrap_err();

        assert!(matches!(err, DemoError::Storage { .. }));
    }

    #[tokio::test]
    async fn test_fetch_command_is_invoked_on_cache_miss() {
        let temp = TempDir::new().unwrap();
        let (subprocess, mut mock) = SubprocessManager::mock();
        mock.expect_command("fetch-dataset")
            .with_args(|args| args.len() == 3 && args[0] == "--quiet" && args[1] == "fsl-feeds")
            .returns_exit_code(0)
            .finish();

        let locator = CacheLocator::new(
            subprocess,
            Some(FetchConfig {
                program: "fetch-dataset".into(),
                args: vec!["--quiet".into()],
                timeout: None,
            }),
        );

        // The mock does not write anything, so the second scan still misses
        let err = locator
            .locate(DatasetId::FslFeeds, temp.path())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::STORAGE_NOT_FOUND);
        assert!(mock.verify_called("fetch-dataset", 1));

        let call = &mock.get_call_history()[0];
        assert_eq!(call.env.get("REALIGN_DATASET").map(String::as_str), Some("fsl-feeds"));
    }

    #[tokio::test]
    async fn test_failed_fetch_is_storage_error() {
        let temp = TempDir::new().unwrap();
        let (subprocess, mut mock) = SubprocessManager::mock();
        mock.expect_command("fetch-dataset")
            .returns_exit_code(1)
            .returns_stderr("network unreachable")
            .finish();

        let locator = CacheLocator::new(
            subprocess,
            Some(FetchConfig {
                program: "fetch-dataset".into(),
                args: vec![],
                timeout: None,
            }),
        );

        let err = locator
            .locate(DatasetId::NyuRest, temp.path())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::STORAGE_FETCH_FAILED);
        assert!(err.to_string().contains("network unreachable"));
    }

    #[tokio::test]
    async fn test_cached_dataset_skips_fetch() {
        let temp = TempDir::new().unwrap();
        nyu_cache(temp.path());
        let (subprocess, mock) = SubprocessManager::mock();

        let locator = CacheLocator::new(
            subprocess,
            Some(FetchConfig {
                program: "fetch-dataset".into(),
                args: vec![],
                timeout: None,
            }),
        );
        locator.locate(DatasetId::NyuRest, temp.path()).await.unwrap();
        assert!(mock.get_call_history().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_read_only_data_dir_fails_before_fetch() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let data_dir = temp.path().join("readonly");
        fs::create_dir_all(&data_dir).unwrap();
        fs::set_permissions(&data_dir, fs::Permissions::from_mode(0o555)).unwrap();

        let (subprocess, mut mock) = SubprocessManager::mock();
        mock.expect_command("fetch-dataset").finish();
        let locator = CacheLocator::new(
            subprocess,
            Some(FetchConfig {
                program: "fetch-dataset".into(),
                args: vec![],
                timeout: None,
            }),
        );

        let result = locator.locate(DatasetId::FslFeeds, &data_dir).await;
        fs::set_permissions(&data_dir, fs::Permissions::from_mode(0o755)).unwrap();

        let err = result.unwrap_err();
        assert_eq!(err.code(), ErrorCode::STORAGE_PERMISSION_DENIED);
        assert!(mock.get_call_history().is_empty());
    }
}

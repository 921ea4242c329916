//! Demo entry points, one per dataset
//!
//! Each demo locates its dataset, groups the raw listing into subjects and
//! hands them to the orchestrator under the dataset's label.

use crate::config::DemoConfig;
use crate::dataset::{CacheLocator, DatasetId, DatasetLocator};
use crate::engine::CommandEngineFactory;
use crate::error::Result;
use crate::orchestrator::{DemoOrchestrator, RunSummary};
use crate::report::SummaryReporter;
use crate::subject::from_listing;
use crate::subprocess::SubprocessManager;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Collaborators and settings shared by every demo
pub struct DemoContext {
    locator: Arc<dyn DatasetLocator>,
    orchestrator: DemoOrchestrator,
    config: DemoConfig,
}

/// Directory overrides taking precedence over config and built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirOverrides {
    pub data_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

impl DemoContext {
    pub fn new(
        locator: Arc<dyn DatasetLocator>,
        orchestrator: DemoOrchestrator,
        config: DemoConfig,
    ) -> Self {
        Self {
            locator,
            orchestrator,
            config,
        }
    }

    /// Cache locator, command engine and text reporter wired from `config`
    pub fn production(config: DemoConfig) -> Self {
        let subprocess = SubprocessManager::production();
        let locator = CacheLocator::new(subprocess.clone(), config.fetch.clone());
        let engines = CommandEngineFactory::new(subprocess, config.engine.clone());
        let reporter = SummaryReporter::new(config.display.wait);

        Self::new(
            Arc::new(locator),
            DemoOrchestrator::new(Arc::new(engines), Arc::new(reporter)),
            config,
        )
    }

    pub fn config(&self) -> &DemoConfig {
        &self.config
    }

    fn resolve_dirs(&self, dataset: DatasetId, dirs: &DirOverrides) -> (PathBuf, PathBuf) {
        let spec = dataset.spec();
        let configured = self.config.dataset_override(dataset);

        let data_dir = dirs
            .data_dir
            .clone()
            .or_else(|| configured.and_then(|o| o.data_dir.clone()))
            .unwrap_or_else(|| PathBuf::from(spec.default_data_dir));
        let output_dir = dirs
            .output_dir
            .clone()
            .or_else(|| configured.and_then(|o| o.output_dir.clone()))
            .unwrap_or_else(|| PathBuf::from(spec.default_output_dir));

        (data_dir, output_dir)
    }
}

/// Run one dataset's demo end to end
pub async fn run_demo(
    ctx: &DemoContext,
    dataset: DatasetId,
    dirs: &DirOverrides,
) -> Result<RunSummary> {
    let spec = dataset.spec();
    let (data_dir, output_dir) = ctx.resolve_dirs(dataset, dirs);
    info!(
        "{}: data in {}, output to {}",
        spec.label,
        data_dir.display(),
        output_dir.display()
    );

    let listing = ctx.locator.locate(dataset, &data_dir).await?;
    let options = ctx.config.grouping.options();

    if dataset == DatasetId::NyuRest {
        let tagged = listing.tagged_sessions();
        if !tagged.contains(&options.session) {
            warn!(
                "{} has no files for session {} (found sessions {:?})",
                spec.label, options.session, tagged
            );
        }
    }

    let factory = from_listing(listing, &output_dir, &options);
    let bundle = ctx.config.engine.bundle(spec.n_sessions);
    ctx.orchestrator
        .run(factory.subjects(), spec.label, &bundle)
        .await
}

/// Run every demo in [`DatasetId::RUN_ORDER`], stopping at the first failure
pub async fn run_all(ctx: &DemoContext) -> Result<Vec<RunSummary>> {
    let mut summaries = Vec::with_capacity(DatasetId::RUN_ORDER.len());
    for dataset in DatasetId::RUN_ORDER {
        summaries.push(run_demo(ctx, dataset, &DirOverrides::default()).await?);
    }
    Ok(summaries)
}

pub async fn demo_nyu_rest(
    ctx: &DemoContext,
    data_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
) -> Result<RunSummary> {
    run_demo(ctx, DatasetId::NyuRest, &DirOverrides { data_dir, output_dir }).await
}

pub async fn demo_fsl_feeds(
    ctx: &DemoContext,
    data_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
) -> Result<RunSummary> {
    run_demo(ctx, DatasetId::FslFeeds, &DirOverrides { data_dir, output_dir }).await
}

pub async fn demo_spm_multimodal_fmri(
    ctx: &DemoContext,
    data_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
) -> Result<RunSummary> {
    run_demo(
        ctx,
        DatasetId::SpmMultimodal,
        &DirOverrides { data_dir, output_dir },
    )
    .await
}

pub async fn demo_spm_auditory(
    ctx: &DemoContext,
    data_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
) -> Result<RunSummary> {
    run_demo(
        ctx,
        DatasetId::SpmAuditory,
        &DirOverrides { data_dir, output_dir },
    )
    .await
}

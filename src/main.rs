use clap::{Parser, Subcommand};
use realign_demos::app::{handle_fatal_error, init_logging, AppConfig};
use realign_demos::config::{ConfigLoader, DemoConfig};
use realign_demos::dataset::{DatasetId, DATASETS};
use realign_demos::demos::{run_all, run_demo, DemoContext, DirOverrides};
use realign_demos::error::{DemoError, ErrorCode};
use realign_demos::orchestrator::RunSummary;
use std::path::PathBuf;
use tracing::debug;

/// Motion-correction demos on public fMRI datasets
#[derive(Parser)]
#[command(name = "realign-demos", version)]
#[command(about = "Run motion-correction demos on public fMRI datasets", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Runs every demo when omitted
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the demos for one or more datasets
    Run {
        /// Datasets to run, in the given order
        #[arg(required = true, value_enum)]
        datasets: Vec<DatasetId>,

        /// Dataset cache directory
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Output directory (single dataset only)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Session to process for session-tagged datasets
        #[arg(long)]
        session: Option<u32>,

        /// Do not wait for Enter after each subject's summary
        #[arg(long)]
        no_wait: bool,
    },
    /// List the known datasets and their default directories
    List,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let app = AppConfig::new(cli.verbose).with_config_path(cli.config.clone());
    init_logging(&app);

    if let Err(e) = run(cli.command, &app).await {
        handle_fatal_error(e, app.verbose);
    }
}

async fn run(command: Option<Commands>, app: &AppConfig) -> anyhow::Result<()> {
    match command {
        Some(Commands::List) => {
            list_datasets();
            Ok(())
        }
        Some(Commands::Run {
            datasets,
            data_dir,
            output_dir,
            session,
            no_wait,
        }) => {
            if output_dir.is_some() && datasets.len() > 1 {
                return Err(DemoError::config_with_code(
                    ErrorCode::CONFIG_INVALID_VALUE,
                    "--output-dir can only be used with a single dataset",
                )
                .into());
            }

            let mut config = load_config(app).await?;
            if let Some(session) = session {
                config.grouping.session = session;
            }
            if no_wait {
                config.display.wait = false;
            }
            config.validate()?;

            let ctx = DemoContext::production(config);
            let dirs = DirOverrides {
                data_dir,
                output_dir,
            };
            for dataset in datasets {
                let summary = run_demo(&ctx, dataset, &dirs).await?;
                print_summary(&summary);
            }
            Ok(())
        }
        None => {
            let ctx = DemoContext::production(load_config(app).await?);
            for summary in run_all(&ctx).await? {
                print_summary(&summary);
            }
            Ok(())
        }
    }
}

async fn load_config(app: &AppConfig) -> anyhow::Result<DemoConfig> {
    let config = ConfigLoader::new(app.config_path.clone()).load().await?;
    debug!("Loaded configuration: {:?}", config);
    Ok(config)
}

fn list_datasets() {
    for spec in DATASETS.iter() {
        println!("{:<16}{}", spec.id.as_str(), spec.label);
        println!("{:<16}data:   {}", "", spec.default_data_dir);
        println!("{:<16}output: {}", "", spec.default_output_dir);
        if let Some(n) = spec.n_sessions {
            println!("{:<16}sessions: {}", "", n);
        }
    }
}

fn print_summary(summary: &RunSummary) {
    println!(
        "✅ {}: {} subject(s), {} session(s) in {:.1?}",
        summary.label, summary.subjects, summary.sessions, summary.elapsed
    );
}

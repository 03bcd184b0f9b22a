// ABOUTME: Entry point for the proago CLI application.
// ABOUTME: Wires the concrete collaborators and runs the promotion.

mod cli;

use clap::Parser;
use cli::Cli;
use proago::activity::FileRecorder;
use proago::chart::HelmCli;
use proago::cluster::{FileReleaseStore, FileRegistry, KubectlLocator};
use proago::config::PromoteConfig;
use proago::error::Result;
use proago::promote::Promoter;
use proago::{config, gitinfo, provider};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let cwd = env::current_dir().expect("Failed to get current directory");

    let registry = FileRegistry::discover(&cwd)?;

    let app = match cli.app {
        Some(app) => app,
        None => config::discover_app_name(&cwd).await?,
    };
    let git_info = gitinfo::discover(&cwd).await;

    let settings = PromoteConfig {
        app,
        version: cli.version.unwrap_or_default(),
        environment: cli.env,
        namespace: cli.namespace,
        release_name: cli.release,
        helm_repo_name: cli.helm_repo_name,
        helm_repo_url: cli.helm_repo_url,
        all_automatic: cli.all_automatic,
        timeout: cli.timeout,
        poll_interval: cli.pull_request_poll_time,
        no_helm_update: cli.no_helm_update,
        no_merge: cli.no_merge,
        batch: cli.batch,
        git_info,
    };

    let provider = provider::connect(cli.git_provider)?;
    let chart = HelmCli::new();
    let recorder = FileRecorder::in_state_dir();
    let locator = KubectlLocator::new();
    let releases = FileReleaseStore::in_state_dir();

    let promoter = Promoter::new(
        &settings,
        &registry,
        provider.as_ref(),
        &chart,
        &recorder,
        &locator,
        &releases,
    );

    if settings.all_automatic {
        println!(
            "Promoting {} to all automatic environments",
            settings.app
        );
        promoter.promote_all_automatic().await?;
        println!("  ✓ All automatic promotions complete");
    } else {
        let release = promoter.run().await?;
        match &release.pull_request {
            Some(info) => println!(
                "  ✓ Promotion of {} landed via {}",
                release.release_name, info.pull_request.url
            ),
            None => println!("  ✓ Promoted release {}", release.release_name),
        }
    }

    let diagnostics = promoter.diagnostics();
    if diagnostics.has_warnings() {
        eprintln!("Completed with {} warning(s):", diagnostics.warnings().len());
        for warning in diagnostics.warnings() {
            eprintln!("  ! {}", warning.message);
        }
    }

    Ok(())
}

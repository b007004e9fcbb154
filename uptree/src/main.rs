use std::path::PathBuf;
use std::pin::pin;

use anyhow::{Context, bail};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uptree::config::ReconcileConfig;
use uptree::selection::build_selection;
use uptree::upload::{
    ConflictPolicy, HttpTransport, PrepareOutcome, PrepareReport, ProcessReport, Session,
};
use uptree_core::CellsClient;

#[derive(Debug, Parser)]
#[command(name = "uptree", version, about = "Upload local files and folders into a remote tree")]
struct Cli {
    /// Base URL of the remote tree API
    #[arg(long, env = "UPTREE_BASE_URL")]
    base_url: String,

    #[arg(long, env = "UPTREE_TOKEN", hide_env_values = true)]
    token: String,

    /// Repository slug the upload lands in
    #[arg(long, env = "UPTREE_REPOSITORY", default_value = "personal-files")]
    repository: String,

    /// Folder inside the repository
    #[arg(long, env = "UPTREE_TARGET", default_value = "/")]
    target: String,

    /// What to do with names that already exist: overwrite, rename,
    /// rename-folders or alert
    #[arg(long, env = "UPTREE_POLICY", default_value = "rename")]
    policy: ConflictPolicy,

    /// Print the final reports as JSON
    #[arg(long)]
    json: bool,

    #[arg(required = true)]
    paths: Vec<PathBuf>,
}

#[derive(Serialize)]
struct Summary<'a> {
    prepare: &'a PrepareReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    process: Option<&'a ProcessReport>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("uptree=info,uptree_core=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing();
    run(cli).await
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let client = CellsClient::new(&cli.base_url, cli.token.as_str())
        .context("invalid UPTREE_BASE_URL")?;
    let session = Session::new(
        cli.repository.as_str(),
        cli.target.as_str(),
        client.clone(),
        ReconcileConfig::from_env(),
    );
    let selection =
        build_selection(&session, &cli.paths).context("failed to read local selection")?;
    info!(
        repository = session.repository_id(),
        target = session.target_node(),
        files = selection.files,
        folders = selection.folders,
        skipped = selection.skipped,
        "selection ready"
    );

    let prepared = session
        .prepare(cli.policy)
        .await
        .context("conflict detection failed")?;
    if prepared.outcome == PrepareOutcome::Confirm {
        if cli.json {
            print_json(&prepared, None)?;
        } else {
            for path in &prepared.conflicts {
                println!("exists: {path}");
            }
        }
        bail!(
            "{} path(s) already exist; re-run with --policy overwrite, rename or rename-folders",
            prepared.conflicts.len()
        );
    }

    let mut progress = session.watch_progress();
    let reporter = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let value = *progress.borrow_and_update();
            eprintln!("[uptree] {value:5.1}%");
        }
    });

    let transport = HttpTransport::new(client);
    let mut process = pin!(session.process(&transport));
    let report = tokio::select! {
        report = &mut process => report,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted, aborting upload");
            session.abort();
            process.await
        }
    }
    .context("upload failed")?;
    reporter.abort();

    if cli.json {
        print_json(&prepared, Some(&report))?;
    } else {
        for rename in &prepared.renamed {
            println!("renamed: {} -> {}", rename.from, rename.to);
        }
        for path in &prepared.unverified {
            println!("unverified: {path} (existence re-check failed, name kept)");
        }
        println!(
            "loaded {}, failed {}, aborted {}, not started {} ({:.1}%)",
            report.loaded, report.failed, report.aborted, report.blocked, report.progress
        );
    }
    if report.failed > 0 || report.aborted > 0 || report.blocked > 0 {
        bail!("upload finished incompletely");
    }
    Ok(())
}

fn print_json(prepare: &PrepareReport, process: Option<&ProcessReport>) -> anyhow::Result<()> {
    let summary = Summary { prepare, process };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

use clap::{Parser, Subcommand};
use sparrow_engine::backend::Backend;
use sparrow_engine::commenter::{CommentClient, CommentSource};
use sparrow_engine::config::{ConfigLoader, SparrowConfig};
use sparrow_engine::ledger::CommentLedger;
use sparrow_engine::scenario;
use sparrow_engine::session::SessionGuard;
use sparrow_engine::store::{self, ArticleStore, TitleSnapshot};
use sparrow_h::backend::HeadlessBackend;
use std::path::PathBuf;
use tracing::warn;

mod menu;

#[derive(Parser)]
#[command(name = "sparrow", version, about = "Yuque browsing automation")]
struct Args {
    #[command(subcommand)]
    task: Option<Task>,

    /// Launch the browser with a visible window (needed for QR login)
    #[arg(long)]
    visible: bool,

    /// Path to a YAML config file (defaults to ./sparrow.yaml)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Clone, Copy, Debug)]
enum Task {
    /// Create a note, verify it, then delete it
    Notes,
    /// Harvest the explore feed, like posts, comment on the first article
    Explore,
    /// Author a document in the first knowledge base
    Docs,
    /// Follow the first author seen in the explore feed
    Follow,
    /// Regenerate the cross-run summary CSV (no browser)
    Summary,
    /// Interactive task menu
    Menu,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log to stderr so stdout stays usable for the interactive menu
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => ConfigLoader::load_from(path).await?,
        None => ConfigLoader::load_default().await?,
    };

    let task = args.task.unwrap_or(Task::Menu);
    if let Task::Summary = task {
        // Pure bookkeeping, no browser involved.
        return regenerate_summary(&config);
    }

    let mut backend = HeadlessBackend::new_with_visibility(args.visible);
    if let Err(e) = backend.launch().await {
        eprintln!("Failed to launch backend: {}", e);
        return Err(e.into());
    }

    let result = run_session(&mut backend, &config, task).await;
    backend.close().await?;
    result
}

async fn run_session(
    backend: &mut HeadlessBackend,
    config: &SparrowConfig,
    task: Task,
) -> anyhow::Result<()> {
    let mut guard = SessionGuard::new(
        config.site.clone(),
        config.files.cookie_file.clone(),
        &config.timing,
    );
    guard.establish(backend).await?;

    match task {
        Task::Menu => menu::run(backend, config, &mut guard).await,
        task => run_task(backend, config, &mut guard, task).await,
    }
}

/// Dispatch one scenario against an established session. Every task that
/// touches the browser re-probes session validity first, so an expired
/// login fails fast instead of half-running a scenario.
pub(crate) async fn run_task<B: Backend + ?Sized>(
    backend: &mut B,
    config: &SparrowConfig,
    guard: &mut SessionGuard,
    task: Task,
) -> anyhow::Result<()> {
    if let Task::Summary = task {
        return regenerate_summary(config);
    }
    guard.ensure_active(backend).await?;

    match task {
        Task::Notes => scenario::notes::run(backend, config).await?,
        Task::Explore => {
            let client = match CommentClient::from_config(&config.commenter) {
                Ok(c) => Some(c),
                Err(e) => {
                    warn!(error = %e, "comment generation disabled");
                    None
                }
            };
            let source = client.as_ref().map(|c| c as &dyn CommentSource);
            scenario::explore::run(backend, config, source).await?;
        }
        Task::Docs => scenario::docs::run(backend, config).await?,
        Task::Follow => scenario::follow::run(backend, config).await?,
        Task::Summary | Task::Menu => unreachable!("handled before dispatch"),
    }
    Ok(())
}

pub(crate) fn regenerate_summary(config: &SparrowConfig) -> anyhow::Result<()> {
    let count = store::write_summary(
        &TitleSnapshot::new(&config.files.titles_file),
        &ArticleStore::new(&config.files.articles_file),
        &CommentLedger::new(&config.files.ledger_file),
        &config.files.summary_file,
    )?;
    println!(
        "Summary written: {} rows -> {}",
        count,
        config.files.summary_file.display()
    );
    Ok(())
}

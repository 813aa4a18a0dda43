use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notify_pipeline::config::Config;
use notify_pipeline::{broker, build_worker_context, run_http_server, workers};

#[derive(Parser)]
#[command(name = "notify-pipeline", about = "Multi-stage notification dispatch pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run one of the background worker loops standalone (§6's CLI contract).
    Workers {
        #[command(subcommand)]
        kind: WorkerKind,
    },
}

#[derive(Subcommand)]
enum WorkerKind {
    Scheduler,
    Repeater,
    Former {
        /// Must name one of `notifications.{high,medium,low}`.
        queue_name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notify_pipeline=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let _sentry_guard = config.sentry_dsn.as_ref().map(|dsn| {
        tracing::info!("initializing Sentry");
        sentry::init((
            dsn.as_str(),
            sentry::ClientOptions {
                traces_sample_rate: 0.0,
                ..Default::default()
            },
        ))
    });

    let cli = Cli::parse();

    match cli.command {
        Some(Command::Workers { kind }) => run_worker_cli(config, kind).await,
        None => run_http_server(config).await,
    }
}

async fn run_worker_cli(config: Config, kind: WorkerKind) -> anyhow::Result<()> {
    match kind {
        WorkerKind::Scheduler => {
            tracing::info!("starting scheduler worker");
            let ctx = build_worker_context(config).await?;
            workers::scheduler::run(ctx).await
        }
        WorkerKind::Repeater => {
            tracing::info!("starting repeater worker");
            let ctx = build_worker_context(config).await?;
            workers::repeater::run(ctx).await
        }
        WorkerKind::Former { queue_name } => {
            if broker::queues::queue_by_name(&queue_name).is_none() {
                eprintln!(
                    "unknown queue name: {queue_name} (expected one of {:?})",
                    broker::queues::list_names()
                );
                std::process::exit(1);
            }
            tracing::info!("starting former worker for {}", queue_name);
            let ctx = build_worker_context(config).await?;
            workers::former::run(ctx, &queue_name).await
        }
    }
}


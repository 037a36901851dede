//! tasklane: submit tasks to and consume tasks from an SQS FIFO queue.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tasklane_core::app::{
    BatchConsumer, EnvelopeBuilder, IngestionGateway, MAX_BATCH_SIZE, Poller, settle,
};
use tasklane_core::config::{MESSAGE_GROUP_ID_VAR, QUEUE_URL_VAR};
use tasklane_core::impls::{DefaultTaskProcessor, InMemoryTaskQueue};
use tasklane_core::ports::MessageSource;
use tasklane_core::QueueConfig;
use tasklane_sqs::{MAX_WAIT_TIME_SECONDS, SqsTaskQueue};
use tokio::io::AsyncReadExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tasklane")]
#[command(about = "Ordered task intake and processing over SQS FIFO", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a task request and send it to the queue
    ///
    /// Prints the HTTP-style response (statusCode, headers, body).
    Ingest {
        #[command(flatten)]
        queue: QueueArgs,

        /// Read the request body from this file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Receive and process queued tasks
    Consume {
        #[command(flatten)]
        queue: QueueArgs,

        /// Messages per receive (1-10)
        #[arg(long, default_value_t = MAX_BATCH_SIZE)]
        max_messages: usize,

        /// Long-poll duration per receive (0-20)
        #[arg(long, default_value_t = MAX_WAIT_TIME_SECONDS)]
        wait_seconds: u32,

        /// Process a single batch, print the batch response and exit
        #[arg(long)]
        once: bool,
    },

    /// Run the whole pipeline against an in-memory queue
    Demo,
}

#[derive(Args)]
struct QueueArgs {
    /// SQS FIFO queue URL
    #[arg(long, env = QUEUE_URL_VAR)]
    queue_url: Option<String>,

    /// Ordering group for sent messages
    #[arg(long, env = MESSAGE_GROUP_ID_VAR)]
    message_group_id: Option<String>,
}

impl QueueArgs {
    fn config(&self) -> Result<QueueConfig> {
        let config = QueueConfig::from_lookup(|key| match key {
            QUEUE_URL_VAR => self.queue_url.clone(),
            MESSAGE_GROUP_ID_VAR => self.message_group_id.clone(),
            _ => None,
        })?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout は JSON 出力用。ログは stderr へ
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Ingest { queue, file } => ingest(&queue, file).await,
        Commands::Consume {
            queue,
            max_messages,
            wait_seconds,
            once,
        } => consume(&queue, max_messages, wait_seconds, once).await,
        Commands::Demo => demo().await,
    }
}

async fn ingest(args: &QueueArgs, file: Option<PathBuf>) -> Result<()> {
    let config = args.config()?;

    let body = match file {
        Some(path) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut body = String::new();
            tokio::io::stdin()
                .read_to_string(&mut body)
                .await
                .context("failed to read request body from stdin")?;
            body
        }
    };

    let queue = Arc::new(SqsTaskQueue::from_env(config.queue_url).await);
    let builder = EnvelopeBuilder::system().with_message_group_id(config.message_group_id);
    let gateway = IngestionGateway::new(queue, builder);

    let response = gateway.handle_request(&body).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

async fn consume(args: &QueueArgs, max_messages: usize, wait_seconds: u32, once: bool) -> Result<()> {
    let config = args.config()?;
    let queue = Arc::new(
        SqsTaskQueue::from_env(config.queue_url)
            .await
            .with_wait_time(wait_seconds),
    );
    let consumer = Arc::new(BatchConsumer::new(Arc::new(DefaultTaskProcessor::new())));

    if once {
        let items = queue.receive(max_messages).await?;
        let result = consumer.process_batch(&items).await;
        settle(queue.as_ref(), &items, &result).await?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let handle = Poller::new(queue, consumer)
        .with_max_messages(max_messages)
        .spawn();
    info!("consuming; press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("shutting down");
    handle.shutdown_and_join().await;
    Ok(())
}

async fn demo() -> Result<()> {
    let queue = Arc::new(InMemoryTaskQueue::new());
    let gateway = IngestionGateway::new(queue.clone(), EnvelopeBuilder::system());

    let requests = [
        json!({"title": "  Write report  ", "description": "Quarterly numbers", "priority": "high", "due_date": "2025-12-31T23:59:59Z"}),
        json!({"title": "Review PR", "description": "Queue adapter", "priority": "medium"}),
        json!({"title": "Water plants", "description": "Office", "priority": "URGENT"}),
        json!({"description": "No title", "priority": "low"}),
    ];
    for request in &requests {
        let response = gateway.handle_request(&request.to_string()).await;
        println!("{}", serde_json::to_string(&response)?);
    }

    let poller = Poller::new(
        queue.clone(),
        Arc::new(BatchConsumer::new(Arc::new(DefaultTaskProcessor::new()))),
    );
    let summary = poller.poll_once().await?;
    let remaining = queue.counts().await;
    println!(
        "{}",
        json!({
            "received": summary.received,
            "deleted": summary.deleted,
            "released": summary.released,
            "remaining": remaining,
        })
    );
    Ok(())
}

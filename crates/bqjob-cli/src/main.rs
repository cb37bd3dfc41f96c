use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use bqjob_core::domain::{JobId, JobState, JobStatus, TableName};
use bqjob_core::impls::{HttpJobsApi, ScriptedJobsApi};
use bqjob_core::ports::{JobResource, JobsApi, QueryResultsResponse};
use bqjob_core::{ClientConfig, QueryJob, observability};

#[derive(Debug, Parser)]
#[command(name = "bqjob", about = "Track an asynchronous query job until it finishes")]
struct Cli {
    /// Emit logs as JSON.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Wait for the job, up to an optional timeout, and print its state.
    Wait {
        #[command(flatten)]
        job: JobArgs,

        /// Give up after this many seconds.
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Wait for the job to finish and print its result table.
    Results {
        #[command(flatten)]
        job: JobArgs,
    },
}

#[derive(Debug, Args)]
struct JobArgs {
    #[arg(long)]
    job_id: String,

    /// Result table, `project:dataset.table` or `dataset.table`.
    #[arg(long)]
    table: String,

    /// Query text the job runs.
    #[arg(long, default_value = "")]
    sql: String,

    /// Overrides BQJOB_POLL_SLICE_SECS.
    #[arg(long)]
    poll_slice: Option<u64>,

    /// Use a scripted in-memory API instead of the network.
    #[arg(long)]
    dry_run: bool,
}

/// in-memory API：2 回 pending を返してから完了
fn dry_run_api() -> Arc<dyn JobsApi> {
    let api = ScriptedJobsApi::new();
    api.push_poll(QueryResultsResponse::pending());
    api.push_poll(QueryResultsResponse::pending());
    api.set_default_poll(QueryResultsResponse::complete());
    api.set_default_job(JobResource {
        job_reference: None,
        status: Some(JobStatus {
            state: JobState::Done,
            error_result: None,
            errors: vec![],
        }),
    });
    Arc::new(api)
}

fn build_job(args: &JobArgs) -> Result<QueryJob> {
    let mut config = ClientConfig::from_env();
    if let Some(secs) = args.poll_slice {
        config.poll_slice_secs = secs;
    }

    let api: Arc<dyn JobsApi> = if args.dry_run {
        dry_run_api()
    } else {
        Arc::new(HttpJobsApi::new(&config).context("building HTTP client")?)
    };

    let job_id = JobId::new(args.job_id.as_str())?;
    let table = TableName::parse_with_default_project(&args.table, config.default_project.as_ref())
        .context("parsing --table")?;

    Ok(QueryJob::new(api, job_id, table, args.sql.as_str()).with_poll_slice(config.poll_slice()))
}

fn print_state(job: &QueryJob) -> Result<()> {
    let inner = job.job();
    let view = serde_json::json!({
        "job_id": job.id(),
        "complete": job.is_complete(),
        "failed": job.failed(),
        "state": inner.last_state(),
        "errors": inner.errors(),
        "fatal_error": inner.fatal_error(),
        "total_time_ms": inner.total_time().map(|d| d.num_milliseconds()),
    });
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    observability::init(cli.json_logs);

    match cli.command {
        Command::Wait { job, timeout } => {
            let mut query = build_job(&job)?;
            query.wait(timeout.map(Duration::from_secs)).await?;
            info!(job_id = %query.id(), complete = query.is_complete(), "wait finished");
            print_state(&query)?;
        }
        Command::Results { job } => {
            let mut query = build_job(&job)?;
            let table = query.results().await?;
            println!("{table}");
        }
    }
    Ok(())
}

//! athena-export — run one Athena query and copy the result to S3.
//!
//! Loads credentials from a secrets file, runs the query, then optionally
//! writes the table as Parquet and the execution metadata as JSON.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use quarry_athena::{AthenaSession, PollPolicy, QueryRequest};

// ── CLI ─────────────────────────────────────────────────────────────

/// Run an Athena query and export the result set.
#[derive(Parser, Debug)]
#[command(name = "athena-export", version, about)]
struct Cli {
    /// Path to the secrets file (AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY, AWS_REGION).
    #[arg(long, env = "QUARRY_SECRETS", default_value = "credentials.env")]
    secrets: PathBuf,

    /// SQL to execute.
    #[arg(long, conflicts_with = "sql_file", required_unless_present = "sql_file")]
    sql: Option<String>,

    /// Read the SQL from a file instead.
    #[arg(long)]
    sql_file: Option<PathBuf>,

    /// Athena database.
    #[arg(long, env = "ATHENA_DATABASE", default_value = "default")]
    database: String,

    /// S3 prefix for Athena's own result files.
    #[arg(long, env = "ATHENA_OUTPUT_LOCATION")]
    output_location: String,

    /// Athena workgroup.
    #[arg(long, env = "ATHENA_WORKGROUP")]
    workgroup: Option<String>,

    /// Seconds between status polls.
    #[arg(long, env = "ATHENA_POLL_INTERVAL_SECS", default_value_t = 2)]
    poll_interval_secs: u64,

    /// Give up (and cancel the query) after this many seconds.
    #[arg(long, env = "ATHENA_TIMEOUT_SECONDS")]
    timeout_secs: Option<u64>,

    /// Write the result table as Parquet to this s3:// URL.
    #[arg(long)]
    parquet_out: Option<String>,

    /// Write the query metadata as JSON to this s3:// URL.
    #[arg(long)]
    json_out: Option<String>,
}

impl Cli {
    fn poll_policy(&self) -> PollPolicy {
        let policy =
            PollPolicy::default().with_interval(Duration::from_secs(self.poll_interval_secs));
        match self.timeout_secs {
            Some(secs) => policy.with_timeout(Duration::from_secs(secs)),
            None => policy,
        }
    }

    fn sql(&self) -> anyhow::Result<String> {
        match (&self.sql, &self.sql_file) {
            (Some(sql), _) => Ok(sql.clone()),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("reading SQL from {}", path.display())),
            (None, None) => anyhow::bail!("either --sql or --sql-file is required"),
        }
    }
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let session = AthenaSession::from_secrets_file(&cli.secrets)
        .with_context(|| format!("loading secrets from {}", cli.secrets.display()))?
        .with_poll_policy(cli.poll_policy());

    let mut request = QueryRequest::new(cli.sql()?, &cli.database, &cli.output_location);
    if let Some(ref wg) = cli.workgroup {
        request = request.with_workgroup(wg);
    }

    let result = session.execute(&request).await?;

    match cli.parquet_out {
        Some(ref target) => {
            let bytes = session.write_parquet(&result.table, target).await?;
            info!(target = %target, bytes, rows = result.row_count(), "exported Parquet");
        }
        None => println!("{result}"),
    }

    if let Some(ref target) = cli.json_out {
        session.write_json(&result.metadata, target).await?;
        info!(target = %target, "exported query metadata");
    }

    Ok(())
}

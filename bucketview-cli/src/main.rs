mod commands;
mod image_processor;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "bucketview")]
#[command(about = "Operator tooling for the bucketview S3 media gallery", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List buckets visible to the configured credentials
    Buckets,

    /// Build a gallery index and print it as JSON
    Index {
        /// S3 bucket name
        #[arg(short, long, env = "BUCKETVIEW_BUCKET")]
        bucket: String,

        /// Restrict to a 4-digit year
        #[arg(short, long)]
        year: Option<String>,

        /// Restrict to a 2-digit zero-padded month
        #[arg(short, long)]
        month: Option<String>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Upload media files with generated thumbnails
    Upload {
        /// Directories or files to upload
        #[arg(required = true)]
        paths: Vec<String>,

        /// S3 bucket name
        #[arg(short, long, env = "BUCKETVIEW_BUCKET")]
        bucket: String,

        /// Capture date as YYYYMMDD; defaults to each file's modification time
        #[arg(short, long)]
        date: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bucketview_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Buckets => {
            commands::buckets::execute().await?;
        }
        Commands::Index {
            bucket,
            year,
            month,
            pretty,
        } => {
            commands::index::execute(bucket, year, month, pretty).await?;
        }
        Commands::Upload {
            paths,
            bucket,
            date,
        } => {
            commands::upload::execute(paths, bucket, date).await?;
        }
    }

    Ok(())
}

use anyhow::Result;
use bucketview_core::{S3Client, StorageConfig};

pub async fn execute() -> Result<()> {
    let s3 = S3Client::new(StorageConfig::from_env()).await;

    let buckets = s3.list_buckets().await;
    if buckets.is_empty() {
        println!("No buckets visible to the configured credentials.");
        return Ok(());
    }

    for bucket in buckets {
        println!("{bucket}");
    }

    Ok(())
}

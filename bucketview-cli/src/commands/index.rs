use anyhow::Result;
use bucketview_core::{build_gallery, Filter, S3Client, StorageConfig};

/// Build the gallery index for a bucket and dump it as JSON. Smoke test
/// for the same pipeline the web server runs per request.
pub async fn execute(
    bucket: String,
    year: Option<String>,
    month: Option<String>,
    pretty: bool,
) -> Result<()> {
    let s3 = S3Client::new(StorageConfig::from_env()).await;

    let filter = Filter::new(year, month);
    let index = build_gallery(&s3, &bucket, &filter).await;

    let json = if pretty {
        serde_json::to_string_pretty(&index)?
    } else {
        serde_json::to_string(&index)?
    };
    println!("{json}");

    Ok(())
}

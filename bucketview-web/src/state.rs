use bucketview_core::{S3Client, StorageConfig};

#[derive(Clone)]
pub struct AppState {
    pub s3: S3Client,
}

impl AppState {
    pub async fn new(config: StorageConfig) -> Self {
        let s3 = S3Client::new(config).await;

        Self { s3 }
    }
}

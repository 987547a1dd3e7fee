use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use crate::config::StorageConfig;
use crate::error::StorageError;

const PRESIGN_EXPIRY: Duration = Duration::from_secs(3600);

/// Gateway to the S3-compatible storage service.
///
/// Not bound to a bucket: the gallery serves whichever bucket the request
/// names, so every call takes the bucket explicitly.
#[derive(Clone)]
pub struct S3Client {
    client: Client,
}

impl S3Client {
    pub async fn new(config: StorageConfig) -> Self {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        if let Some(credentials) = config.credentials() {
            config_loader = config_loader.credentials_provider(credentials);
        }

        // Custom endpoint means MinIO/LocalStack/etc, which need path-style
        // addressing
        if let Some(endpoint_url) = &config.endpoint_url {
            config_loader = config_loader.endpoint_url(endpoint_url);
        }

        let sdk_config = config_loader.load().await;
        let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if config.endpoint_url.is_some() {
            s3_config_builder = s3_config_builder.force_path_style(true);
        }

        let client = Client::from_conf(s3_config_builder.build());

        Self { client }
    }

    /// List all buckets visible to the configured credentials.
    ///
    /// Failures are logged and produce an empty list; a broken storage
    /// backend must not break page rendering.
    pub async fn list_buckets(&self) -> Vec<String> {
        match self.client.list_buckets().send().await {
            Ok(response) => response
                .buckets()
                .iter()
                .filter_map(|bucket| bucket.name().map(str::to_string))
                .collect(),
            Err(e) => {
                tracing::error!("Error retrieving bucket list: {:?}", e);
                Vec::new()
            }
        }
    }

    /// List every object key in a bucket, paging until the listing is
    /// exhausted. Buckets with tens of thousands of keys come back complete.
    pub async fn list_all_objects(&self, bucket: &str) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(bucket);
            if let Some(token) = &continuation_token {
                request = request.continuation_token(token);
            }

            let response = request.send().await.map_err(|e| StorageError::ListObjects {
                bucket: bucket.to_string(),
                source: Box::new(e),
            })?;

            if let Some(contents) = response.contents {
                for object in contents {
                    if let Some(key) = object.key {
                        keys.push(key);
                    }
                }
            }

            match response.next_continuation_token {
                Some(token) => continuation_token = Some(token),
                None => break,
            }
        }

        tracing::debug!("S3 LIST: bucket={}, keys={}", bucket, keys.len());
        Ok(keys)
    }

    /// Request a presigned GET URL for one object, valid for one hour.
    pub async fn presign_get(&self, bucket: &str, key: &str) -> Result<String, StorageError> {
        let presigning_config = PresigningConfig::expires_in(PRESIGN_EXPIRY)
            .map_err(|e| StorageError::PresignConfig(e.to_string()))?;

        let presigned = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning_config)
            .await
            .map_err(|e| StorageError::Presign {
                bucket: bucket.to_string(),
                key: key.to_string(),
                source: Box::new(e),
            })?;

        Ok(presigned.uri().to_string())
    }

    /// Check if an object exists via a HEAD request.
    pub async fn object_exists(&self, bucket: &str, key: &str) -> bool {
        self.client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .is_ok()
    }

    /// Upload a local file to S3.
    pub async fn put_file(
        &self,
        bucket: &str,
        key: &str,
        local_path: &Path,
    ) -> Result<(), StorageError> {
        tracing::debug!(
            "S3 PUT: bucket={}, key={}, local_path={:?}",
            bucket,
            key,
            local_path
        );

        let body = ByteStream::from_path(local_path)
            .await
            .map_err(|e| StorageError::Upload {
                bucket: bucket.to_string(),
                key: key.to_string(),
                source: Box::new(e),
            })?;

        self.put_body(bucket, key, body).await
    }

    /// Upload in-memory bytes to S3.
    pub async fn put_bytes(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
    ) -> Result<(), StorageError> {
        tracing::debug!(
            "S3 PUT (bytes): bucket={}, key={}, size={} bytes",
            bucket,
            key,
            data.len()
        );

        self.put_body(bucket, key, ByteStream::from(data)).await
    }

    async fn put_body(
        &self,
        bucket: &str,
        key: &str,
        body: ByteStream,
    ) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .content_type(guess_content_type(key))
            .send()
            .await
            .map_err(|e| StorageError::Upload {
                bucket: bucket.to_string(),
                key: key.to_string(),
                source: Box::new(e),
            })?;

        tracing::debug!("S3 PUT success: key={}", key);
        Ok(())
    }
}

/// The listing and presigning operations the gallery builder consumes.
///
/// [`S3Client`] is the production implementation; the builder's tests
/// substitute in-memory fakes.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn list_all_objects(&self, bucket: &str) -> Result<Vec<String>, StorageError>;
    async fn presign_get(&self, bucket: &str, key: &str) -> Result<String, StorageError>;
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_all_objects(&self, bucket: &str) -> Result<Vec<String>, StorageError> {
        S3Client::list_all_objects(self, bucket).await
    }

    async fn presign_get(&self, bucket: &str, key: &str) -> Result<String, StorageError> {
        S3Client::presign_get(self, bucket, key).await
    }
}

fn guess_content_type(key: &str) -> &'static str {
    if key.ends_with(".jpg") || key.ends_with(".jpeg") {
        "image/jpeg"
    } else if key.ends_with(".png") {
        "image/png"
    } else if key.ends_with(".gif") {
        "image/gif"
    } else if key.ends_with(".mp4") {
        "video/mp4"
    } else if key.ends_with(".mov") {
        "video/quicktime"
    } else if key.ends_with(".avi") {
        "video/x-msvideo"
    } else {
        "application/octet-stream"
    }
}

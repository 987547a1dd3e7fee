use thiserror::Error;

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Failures from the storage gateway.
///
/// Each variant names the bucket (and key, where one applies) so that log
/// lines identify the exact object that was skipped.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to list objects in bucket {bucket}: {source}")]
    ListObjects { bucket: String, source: BoxedError },

    #[error("failed to presign {key} in bucket {bucket}: {source}")]
    Presign {
        bucket: String,
        key: String,
        source: BoxedError,
    },

    #[error("failed to upload {key} to bucket {bucket}: {source}")]
    Upload {
        bucket: String,
        key: String,
        source: BoxedError,
    },

    #[error("invalid presign expiry: {0}")]
    PresignConfig(String),
}

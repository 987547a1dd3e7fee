use std::env;

/// Connection settings for the object storage service.
///
/// Always constructed explicitly and handed to [`crate::S3Client::new`];
/// credentials are never read from global state after startup.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub endpoint_url: Option<String>,
    pub region: String,
}

const DEFAULT_REGION: &str = "us-east-1";

impl StorageConfig {
    /// Build a config from the standard AWS environment variables.
    ///
    /// When access key or secret key is missing, the SDK's default
    /// credential chain is used instead (instance profiles, shared
    /// config files, etc).
    pub fn from_env() -> Self {
        Self {
            access_key: env::var("AWS_ACCESS_KEY_ID").ok(),
            secret_key: env::var("AWS_SECRET_ACCESS_KEY").ok(),
            endpoint_url: env::var("AWS_ENDPOINT_URL").ok(),
            region: env::var("AWS_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string()),
        }
    }

    /// Static credentials, when both halves were provided.
    pub fn credentials(&self) -> Option<aws_credential_types::Credentials> {
        match (&self.access_key, &self.secret_key) {
            (Some(access), Some(secret)) => Some(aws_credential_types::Credentials::new(
                access, secret, None, None, "bucketview",
            )),
            _ => None,
        }
    }
}

pub mod config;
pub mod error;
pub mod gallery;
pub mod media;
pub mod s3;

pub use config::StorageConfig;
pub use error::StorageError;
pub use gallery::{build_gallery, Filter, GalleryIndex, MediaItem};
pub use media::{CaptureDate, MediaKind};
pub use s3::{ObjectStore, S3Client};

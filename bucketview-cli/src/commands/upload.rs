use anyhow::{Context, Result};
use bucketview_core::gallery::thumbnail_key;
use bucketview_core::{MediaKind, S3Client, StorageConfig};
use chrono::{DateTime, Local};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use crate::image_processor::{create_thumbnail, media_kind_of, upload_file_name};

struct PreparedUpload {
    path: PathBuf,
    key: String,
    thumbnail: Option<Vec<u8>>,
}

pub async fn execute(paths: Vec<String>, bucket: String, date: Option<String>) -> Result<()> {
    if let Some(date) = &date {
        if date.len() != 8 || !date.chars().all(|c| c.is_ascii_digit()) {
            anyhow::bail!("--date must be 8 digits (YYYYMMDD), got: {date}");
        }
    }

    // Initialize S3 client
    let s3 = S3Client::new(StorageConfig::from_env()).await;

    // Collect all media paths
    let media_paths = collect_media_paths(paths)?;

    if media_paths.is_empty() {
        anyhow::bail!("No supported media files found in the provided paths");
    }

    println!("Bucket: {}", bucket);
    println!("Media files: {}\n", media_paths.len());

    // Prepare uploads in parallel using rayon (thumbnail generation is
    // CPU-bound)
    let process_pb = ProgressBar::new(media_paths.len() as u64);
    process_pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .expect("Invalid progress bar template")
            .progress_chars("█▓▒░ "),
    );
    process_pb.set_message("Preparing media...");

    let pb = Arc::new(process_pb);
    let date = date.as_deref();

    let prepared: Vec<PreparedUpload> = media_paths
        .par_iter()
        .map(|path| {
            let key = upload_key(path, date)?;

            // Videos go up as-is; the gallery only expects generated
            // thumbnails for images
            let thumbnail = match media_kind_of(path) {
                Some(MediaKind::Image) => Some(create_thumbnail(path)?),
                _ => None,
            };

            pb.inc(1);
            pb.set_message(format!("Prepared: {}", key));

            Ok::<_, anyhow::Error>(PreparedUpload {
                path: path.clone(),
                key,
                thumbnail,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    pb.finish_with_message("Preparation complete");
    println!();

    // Upload concurrently using tokio (I/O-bound work)
    let upload_pb = ProgressBar::new(prepared.len() as u64);
    upload_pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.green/blue} {pos}/{len} {msg}")
            .expect("Invalid progress bar template")
            .progress_chars("█▓▒░ "),
    );
    upload_pb.set_message("Uploading to S3...");

    let mut upload_tasks = Vec::new();

    for item in prepared {
        let s3_clone = s3.clone();
        let bucket_clone = bucket.clone();
        let pb_clone = upload_pb.clone();

        let task = tokio::spawn(async move {
            let key = item.key.clone();
            let result = upload_media(s3_clone, bucket_clone, item).await;
            pb_clone.inc(1);
            pb_clone.set_message(format!("Uploaded: {}", key));
            result
        });

        upload_tasks.push(task);
    }

    let mut uploaded = 0usize;
    let mut skipped = 0usize;
    for task in upload_tasks {
        if task.await?? {
            uploaded += 1;
        } else {
            skipped += 1;
        }
    }

    upload_pb.finish_with_message("All media uploaded");
    println!();
    println!("✓ Upload complete!");
    println!("Uploaded: {uploaded}, already present: {skipped}");

    Ok(())
}

/// Upload one file plus its thumbnail companion. Returns false when the
/// key already exists and was skipped.
async fn upload_media(s3: S3Client, bucket: String, item: PreparedUpload) -> Result<bool> {
    if s3.object_exists(&bucket, &item.key).await {
        tracing::info!("Skipping existing object: {}", item.key);
        return Ok(false);
    }

    s3.put_file(&bucket, &item.key, &item.path).await?;

    if let Some(thumbnail) = item.thumbnail {
        let thumb_key = thumbnail_key(&item.key);
        // A missing thumbnail only degrades the grid, so don't fail the
        // upload over it
        if let Err(e) = s3.put_bytes(&bucket, &thumb_key, thumbnail).await {
            tracing::warn!("Failed to upload thumbnail {}: {}", thumb_key, e);
        }
    }

    Ok(true)
}

/// The object key for a local file: `YYYYMMDD_<lowercased file name>`, the
/// prefix the gallery's date extraction expects.
fn upload_key(path: &Path, date_override: Option<&str>) -> Result<String> {
    let name = upload_file_name(path)
        .context(format!("File has no name: {}", path.display()))?;
    let prefix = match date_override {
        Some(date) => date.to_string(),
        None => {
            let modified = fs::metadata(path)
                .and_then(|meta| meta.modified())
                .context(format!("Failed to stat {}", path.display()))?;
            DateTime::<Local>::from(modified).format("%Y%m%d").to_string()
        }
    };
    Ok(format!("{prefix}_{name}"))
}

fn collect_media_paths(paths: Vec<String>) -> Result<Vec<PathBuf>> {
    let mut media_paths = Vec::new();

    for path_str in paths {
        let path = PathBuf::from(&path_str);

        if path.is_file() {
            if media_kind_of(&path).is_some() {
                media_paths.push(path);
            } else {
                tracing::warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            for entry in WalkDir::new(&path).into_iter().filter_map(|e| e.ok()) {
                if entry.file_type().is_file() && media_kind_of(entry.path()).is_some() {
                    media_paths.push(entry.path().to_path_buf());
                }
            }
        } else {
            anyhow::bail!("Path does not exist: {path_str}");
        }
    }

    media_paths.sort();
    Ok(media_paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_key_uses_date_override() {
        let key = upload_key(&PathBuf::from("/tmp/IMG_001.JPG"), Some("20230115")).unwrap();
        assert_eq!(key, "20230115_img_001.jpg");
    }

    #[test]
    fn upload_key_matches_gallery_date_extraction() {
        let key = upload_key(&PathBuf::from("/tmp/beach.jpg"), Some("20240220")).unwrap();
        let date = bucketview_core::CaptureDate::from_key(&key).unwrap();
        assert_eq!(date.date_key(), "2024-02-20");
    }
}

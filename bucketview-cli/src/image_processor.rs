use anyhow::{Context, Result};
use bucketview_core::MediaKind;
use image::{imageops::FilterType, DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;
use std::path::Path;

const THUMBNAIL_SIZE: u32 = 400;

/// Render a grid thumbnail for an image file.
///
/// Always encoded as JPEG; the gallery grid never needs more than 400px
/// on the longest edge.
pub fn create_thumbnail(path: &Path) -> Result<Vec<u8>> {
    tracing::debug!("Creating thumbnail: {}", path.display());

    let img = image::open(path)
        .context(format!("Failed to open image: {}", path.display()))?;

    let resized = resize_to_fit(&img, THUMBNAIL_SIZE);

    let mut buffer = Cursor::new(Vec::new());
    resized
        .write_to(&mut buffer, ImageFormat::Jpeg)
        .context("Failed to encode thumbnail JPEG")?;

    Ok(buffer.into_inner())
}

fn resize_to_fit(img: &DynamicImage, max_size: u32) -> DynamicImage {
    let (width, height) = img.dimensions();

    // Only resize if larger than target
    if width > max_size || height > max_size {
        img.resize(max_size, max_size, FilterType::Lanczos3)
    } else {
        img.clone()
    }
}

/// Whether the gallery would recognize this file at all. Classification
/// happens on the lowercase file name because that is exactly what the
/// uploaded key will be.
pub fn media_kind_of(path: &Path) -> Option<MediaKind> {
    MediaKind::classify(&upload_file_name(path)?)
}

/// The object key component for a local file: its name, lowercased so the
/// suffix matches the gallery's case-sensitive classifier.
pub fn upload_file_name(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn recognizes_gallery_media() {
        assert_eq!(
            media_kind_of(&PathBuf::from("/tmp/a.jpg")),
            Some(MediaKind::Image)
        );
        assert_eq!(
            media_kind_of(&PathBuf::from("/tmp/clip.MP4")),
            Some(MediaKind::Video)
        );
        assert_eq!(media_kind_of(&PathBuf::from("/tmp/notes.txt")), None);
    }

    #[test]
    fn upload_names_are_lowercased() {
        assert_eq!(
            upload_file_name(&PathBuf::from("/tmp/IMG_0001.JPG")),
            Some("img_0001.jpg".to_string())
        );
    }

    #[test]
    fn small_images_are_not_upscaled() {
        let img = DynamicImage::new_rgb8(100, 80);
        let resized = resize_to_fit(&img, THUMBNAIL_SIZE);
        assert_eq!(resized.dimensions(), (100, 80));
    }

    #[test]
    fn large_images_shrink_to_the_longest_edge() {
        let img = DynamicImage::new_rgb8(800, 400);
        let resized = resize_to_fit(&img, THUMBNAIL_SIZE);
        assert_eq!(resized.dimensions(), (400, 200));
    }
}

//! Photo decode, thumbnail and re-encode.
//!
//! Uploads are sniffed from their bytes, not trusted by extension. Only
//! JPEG and PNG are accepted. Each accepted upload produces two files in
//! the upload directory:
//!
//! ```text
//! <nanos>.<ext>        original, re-encoded in its own format
//! thumb_<nanos>.jpg    fixed-size thumbnail, always JPEG
//! ```
//!
//! The two writes are not transactional: if the thumbnail write fails,
//! the original stays behind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use tracing::{debug, warn};

/// Prefix of thumbnail file names.
const THUMBNAIL_PREFIX: &str = "thumb_";

/// Errors that can occur while storing a photo.
#[derive(Debug, thiserror::Error)]
pub enum PhotoError {
    /// The upload is not a JPEG or PNG image.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// The image could not be decoded or encoded.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Writing to the upload directory failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// File name of the thumbnail belonging to the photo `name`.
pub fn thumbnail_name(name: &str) -> String {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name);
    format!("{THUMBNAIL_PREFIX}{stem}.jpg")
}

/// Writes photos and thumbnails to an upload directory.
#[derive(Debug, Clone)]
pub struct PhotoStore {
    dir: PathBuf,
    thumb_width: u32,
    thumb_height: u32,
}

impl PhotoStore {
    /// Create a store writing to `dir` with the given thumbnail size.
    pub fn new(dir: impl Into<PathBuf>, thumb_width: u32, thumb_height: u32) -> Self {
        Self {
            dir: dir.into(),
            thumb_width,
            thumb_height,
        }
    }

    /// The upload directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Decode `bytes`, write the original and its thumbnail, and return
    /// the original's file name.
    ///
    /// `original_name` is the client-side file name; its extension is
    /// kept when it agrees with the sniffed format.
    pub fn save(&self, bytes: &[u8], original_name: Option<&str>) -> Result<String, PhotoError> {
        let format = image::guess_format(bytes)
            .map_err(|e| PhotoError::UnsupportedFormat(e.to_string()))?;
        let extension = extension_for(format, original_name)?;

        let image = image::load_from_memory_with_format(bytes, format)?;
        std::fs::create_dir_all(&self.dir)?;

        let stem = self.unique_stem(extension);
        let name = format!("{stem}.{extension}");
        image.save_with_format(self.dir.join(&name), format)?;

        let thumbnail = self.thumbnail(&image);
        thumbnail.save_with_format(self.dir.join(thumbnail_name(&name)), ImageFormat::Jpeg)?;

        debug!(
            name = %name,
            width = image.width(),
            height = image.height(),
            "photo stored"
        );
        Ok(name)
    }

    /// Remove a photo and its thumbnail. Files already gone are ignored.
    pub fn delete(&self, name: &str) {
        let Some(file_name) = Path::new(name).file_name() else {
            return;
        };
        for path in [self.dir.join(file_name), self.dir.join(thumbnail_name(name))] {
            match std::fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "photo file removed"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove photo file"),
            }
        }
    }

    fn thumbnail(&self, image: &DynamicImage) -> DynamicImage {
        let resized = image.resize_to_fill(self.thumb_width, self.thumb_height, FilterType::Lanczos3);
        DynamicImage::ImageRgb8(resized.to_rgb8())
    }

    /// A nanosecond timestamp not yet used by a file in the directory.
    fn unique_stem(&self, extension: &str) -> i64 {
        let mut stem = Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_else(|| Utc::now().timestamp_micros());
        while self.dir.join(format!("{stem}.{extension}")).exists()
            || self.dir.join(thumbnail_name(&stem.to_string())).exists()
        {
            stem = stem.saturating_add(1);
        }
        stem
    }
}

fn extension_for(format: ImageFormat, original_name: Option<&str>) -> Result<&'static str, PhotoError> {
    let given = original_name
        .and_then(|n| Path::new(n).extension())
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match format {
        ImageFormat::Jpeg => Ok(if given.as_deref() == Some("jpeg") {
            "jpeg"
        } else {
            "jpg"
        }),
        ImageFormat::Png => Ok("png"),
        other => Err(PhotoError::UnsupportedFormat(format!("{other:?}"))),
    }
}

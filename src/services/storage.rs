// src/services/storage.rs
// DOCUMENTATION: File storage and image processing
// PURPOSE: Persist uploads per user, build thumbnails and serve transforms

use crate::config::Config;
use crate::errors::GalleryError;
use crate::models::{StoredFile, TransformQuery};
use chrono::Utc;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use uuid::Uuid;

/// Content types accepted by the upload endpoint
pub const ALLOWED_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

pub const DEFAULT_QUALITY: u8 = 80;

const THUMBNAIL_QUALITY: u8 = 85;

/// Largest edge a transform may produce
const MAX_DIMENSION: u32 = 8000;

/// Largest pixel count a transform may produce
const MAX_PIXELS: u64 = 40_000_000;

/// Encodings the storage service can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
}

impl OutputFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::WebP => "image/webp",
        }
    }

    fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(OutputFormat::Jpeg),
            ImageFormat::Png => Some(OutputFormat::Png),
            ImageFormat::WebP => Some(OutputFormat::WebP),
            _ => None,
        }
    }

    /// Sniff the format from the leading bytes
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        image::guess_format(bytes)
            .ok()
            .and_then(Self::from_image_format)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
        };
        f.write_str(name)
    }
}

impl FromStr for OutputFormat {
    type Err = GalleryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "webp" => Ok(OutputFormat::WebP),
            _ => Err(GalleryError::InvalidInput("Unsupported format".to_string())),
        }
    }
}

/// Per-user file storage rooted at the upload and thumbnail directories
#[derive(Debug, Clone)]
pub struct StorageService {
    upload_dir: PathBuf,
    thumbnail_dir: PathBuf,
    max_upload_bytes: usize,
    thumbnail_size: u32,
}

impl StorageService {
    pub fn new(
        upload_dir: impl Into<PathBuf>,
        thumbnail_dir: impl Into<PathBuf>,
        max_upload_bytes: usize,
        thumbnail_size: u32,
    ) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            thumbnail_dir: thumbnail_dir.into(),
            max_upload_bytes,
            thumbnail_size: thumbnail_size.max(1),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.upload_dir,
            &config.thumbnail_dir,
            config.max_upload_bytes,
            config.thumbnail_size,
        )
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Validate and store an upload together with its thumbnail
    pub async fn save_upload(
        &self,
        user_id: Uuid,
        original_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredFile, GalleryError> {
        if bytes.is_empty() {
            return Err(GalleryError::InvalidInput("No file uploaded".to_string()));
        }
        if bytes.len() > self.max_upload_bytes {
            return Err(GalleryError::InvalidInput(format!(
                "File too large (max {} bytes)",
                self.max_upload_bytes
            )));
        }
        if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
            return Err(GalleryError::InvalidInput(
                "Only JPEG, PNG and WebP images are allowed".to_string(),
            ));
        }
        let format = OutputFormat::detect(&bytes).ok_or_else(|| {
            GalleryError::InvalidInput("Only JPEG, PNG and WebP images are allowed".to_string())
        })?;

        let filename = unique_filename(original_name);

        let size = self.thumbnail_size;
        let (bytes, thumbnail, width, height) = tokio::task::spawn_blocking(move || {
            let img = decode(&bytes)?;
            let (width, height) = (img.width(), img.height());
            let thumb = img.resize_to_fill(size, size, FilterType::Triangle);
            let thumbnail = encode(&thumb, format, THUMBNAIL_QUALITY)?;
            Ok::<_, GalleryError>((bytes, thumbnail, width, height))
        })
        .await
        .map_err(|e| GalleryError::InternalError(format!("Thumbnail task failed: {}", e)))??;

        let original_path = self.user_dir(&self.upload_dir, user_id).join(&filename);
        let thumbnail_path = self.user_dir(&self.thumbnail_dir, user_id).join(&filename);
        write_file(&original_path, &bytes).await?;
        write_file(&thumbnail_path, &thumbnail).await?;

        log::info!(
            "Stored {} for user {} ({}x{}, {} bytes)",
            filename,
            user_id,
            width,
            height,
            bytes.len()
        );

        Ok(StoredFile {
            message: "Image uploaded successfully".to_string(),
            original: original_url(user_id, &filename),
            thumbnail: thumbnail_url(user_id, &filename),
            width,
            height,
        })
    }

    /// Remove an original and its thumbnail. Missing files are not an error.
    pub async fn delete_upload(&self, user_id: Uuid, filename: &str) -> Result<(), GalleryError> {
        let paths = [
            self.original_path(user_id, filename)?,
            self.thumbnail_path(user_id, filename)?,
        ];

        for path in paths {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    log::error!("Failed to delete {}: {}", path.display(), e);
                    return Err(GalleryError::StorageError(format!("Failed to delete file: {}", e)));
                }
            }
        }

        log::info!("Deleted {} of user {}", filename, user_id);
        Ok(())
    }

    /// Path of a user's upload, rejecting traversal attempts
    pub fn original_path(&self, user_id: Uuid, filename: &str) -> Result<PathBuf, GalleryError> {
        validate_filename(filename)?;
        Ok(self.user_dir(&self.upload_dir, user_id).join(filename))
    }

    pub fn thumbnail_path(&self, user_id: Uuid, filename: &str) -> Result<PathBuf, GalleryError> {
        validate_filename(filename)?;
        Ok(self.user_dir(&self.thumbnail_dir, user_id).join(filename))
    }

    pub async fn read_original(&self, user_id: Uuid, filename: &str) -> Result<Vec<u8>, GalleryError> {
        read_file(&self.original_path(user_id, filename)?, "Image").await
    }

    pub async fn read_thumbnail(&self, user_id: Uuid, filename: &str) -> Result<Vec<u8>, GalleryError> {
        read_file(&self.thumbnail_path(user_id, filename)?, "Thumbnail").await
    }

    /// Resize and/or re-encode one of a user's uploads
    pub async fn transform(
        &self,
        user_id: Uuid,
        filename: &str,
        query: TransformQuery,
    ) -> Result<(Vec<u8>, OutputFormat), GalleryError> {
        // Reject bad parameters before touching the disk
        let requested = query.format.as_deref().map(str::parse::<OutputFormat>).transpose()?;
        let quality = quality_or_default(query.quality)?;

        let bytes = self.read_original(user_id, filename).await?;

        tokio::task::spawn_blocking(move || {
            let output = match requested {
                Some(format) => format,
                None => OutputFormat::detect(&bytes).unwrap_or(OutputFormat::Jpeg),
            };
            transform_bytes(&bytes, query.width, query.height, output, quality)
                .map(|data| (data, output))
        })
        .await
        .map_err(|e| GalleryError::InternalError(format!("Transform task failed: {}", e)))?
    }

    fn user_dir(&self, root: &Path, user_id: Uuid) -> PathBuf {
        root.join(user_id.to_string())
    }
}

/// `{millis}-{random}-{sanitized name}`
fn unique_filename(original_name: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}",
        Utc::now().timestamp_millis(),
        &suffix[..8],
        sanitize_filename(original_name)
    )
}

/// Public URL of a stored original; this is what images record as `file_url`
pub fn original_url(user_id: Uuid, filename: &str) -> String {
    format!("/api/storage/uploads/{}/{}", user_id, filename)
}

pub fn thumbnail_url(user_id: Uuid, filename: &str) -> String {
    format!("/api/storage/thumbnails/{}/{}", user_id, filename)
}

/// Keep ASCII letters, digits, dot, dash and underscore; everything else becomes `_`
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.chars().take(200).collect()
    }
}

/// A requested filename must name a single file inside the user's directory
pub fn validate_filename(filename: &str) -> Result<(), GalleryError> {
    let invalid = filename.is_empty()
        || filename == "."
        || filename.contains("..")
        || filename.contains(['/', '\\', '\0']);

    if invalid {
        return Err(GalleryError::InvalidInput("Invalid filename".to_string()));
    }
    Ok(())
}

fn quality_or_default(quality: Option<u8>) -> Result<u8, GalleryError> {
    match quality {
        None => Ok(DEFAULT_QUALITY),
        Some(q) if (1..=100).contains(&q) => Ok(q),
        Some(_) => Err(GalleryError::InvalidInput(
            "Quality must be between 1 and 100".to_string(),
        )),
    }
}

/// Output size; a single given edge keeps the aspect ratio.
/// Both edges and the pixel count are bounded, including a derived edge.
pub fn target_dimensions(
    width: u32,
    height: u32,
    req_width: Option<u32>,
    req_height: Option<u32>,
) -> Result<Option<(u32, u32)>, GalleryError> {
    if req_width == Some(0) || req_height == Some(0) {
        return Err(GalleryError::InvalidInput("Width and height must be positive".to_string()));
    }

    let scaled = |value: u32, num: u32, den: u32| -> f64 {
        (value as f64 * num as f64 / den.max(1) as f64).round().max(1.0)
    };

    let (w, h) = match (req_width, req_height) {
        (Some(w), Some(h)) => (w as f64, h as f64),
        (Some(w), None) => (w as f64, scaled(height, w, width)),
        (None, Some(h)) => (scaled(width, h, height), h as f64),
        (None, None) => return Ok(None),
    };

    let max = MAX_DIMENSION as f64;
    if w > max || h > max {
        return Err(GalleryError::InvalidInput(format!(
            "Output must not exceed {}x{} pixels",
            MAX_DIMENSION, MAX_DIMENSION
        )));
    }
    if w * h > MAX_PIXELS as f64 {
        return Err(GalleryError::InvalidInput(format!(
            "Output must not exceed {} pixels",
            MAX_PIXELS
        )));
    }

    Ok(Some((w as u32, h as u32)))
}

/// Blocking: decode, optionally resize, then encode
pub fn transform_bytes(
    bytes: &[u8],
    width: Option<u32>,
    height: Option<u32>,
    output: OutputFormat,
    quality: u8,
) -> Result<Vec<u8>, GalleryError> {
    let img = decode(bytes)?;
    let img = match target_dimensions(img.width(), img.height(), width, height)? {
        Some((w, h)) => img.resize_exact(w, h, FilterType::Triangle),
        None => img,
    };
    encode(&img, output, quality)
}

fn decode(bytes: &[u8]) -> Result<DynamicImage, GalleryError> {
    image::load_from_memory(bytes)
        .map_err(|e| GalleryError::InvalidInput(format!("Failed to decode image: {}", e)))
}

/// Quality applies to JPEG; the PNG and WebP encoders are lossless
fn encode(img: &DynamicImage, format: OutputFormat, quality: u8) -> Result<Vec<u8>, GalleryError> {
    let mut buf = Cursor::new(Vec::new());

    let result = match format {
        OutputFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))
        }
        OutputFormat::Png => img.write_to(&mut buf, ImageFormat::Png),
        OutputFormat::WebP => {
            let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
            rgba.write_to(&mut buf, ImageFormat::WebP)
        }
    };

    result.map_err(|e| GalleryError::StorageError(format!("Failed to encode {}: {}", format, e)))?;
    Ok(buf.into_inner())
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), GalleryError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            log::error!("Failed to create {}: {}", parent.display(), e);
            GalleryError::StorageError(format!("Failed to create directory: {}", e))
        })?;
    }

    tokio::fs::write(path, bytes).await.map_err(|e| {
        log::error!("Failed to write {}: {}", path.display(), e);
        GalleryError::StorageError(format!("Failed to write file: {}", e))
    })
}

async fn read_file(path: &Path, what: &str) -> Result<Vec<u8>, GalleryError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(GalleryError::NotFound(what.to_string()))
        }
        Err(e) => {
            log::error!("Failed to read {}: {}", path.display(), e);
            Err(GalleryError::StorageError(format!("Failed to read file: {}", e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn sample_png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 30, 30])));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn storage(dir: &tempfile::TempDir, max: usize) -> StorageService {
        StorageService::new(dir.path().join("uploads"), dir.path().join("thumbs"), max, 16)
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("my photo (1).png"), "my_photo__1_.png");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("..."), "upload");
    }

    #[test]
    fn test_validate_filename() {
        assert!(validate_filename("123-cat.png").is_ok());
        assert!(validate_filename("../secret").is_err());
        assert!(validate_filename("a/b.png").is_err());
        assert!(validate_filename("").is_err());
    }

    #[test]
    fn test_target_dimensions_keep_aspect() {
        assert_eq!(target_dimensions(400, 200, Some(100), None).unwrap(), Some((100, 50)));
        assert_eq!(target_dimensions(400, 200, None, Some(100)).unwrap(), Some((200, 100)));
        assert_eq!(target_dimensions(400, 200, Some(10), Some(10)).unwrap(), Some((10, 10)));
        assert_eq!(target_dimensions(400, 200, None, None).unwrap(), None);
        assert!(target_dimensions(400, 200, Some(0), None).is_err());
    }

    #[test]
    fn test_target_dimensions_bound_derived_edge() {
        // Tall narrow source: the derived height would be enormous
        assert!(target_dimensions(1, 100_000, Some(8000), None).is_err());
        assert!(target_dimensions(1, 1_000_000, Some(8000), None).is_err());
        assert!(target_dimensions(100_000, 1, None, Some(8000)).is_err());

        // Both edges within bounds but too many pixels
        assert!(target_dimensions(100, 100, Some(8000), Some(8000)).is_err());
        assert!(target_dimensions(100, 100, Some(9000), None).is_err());

        assert_eq!(
            target_dimensions(1000, 500, Some(8000), None).unwrap(),
            Some((8000, 4000))
        );
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("JPG".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert_eq!("webp".parse::<OutputFormat>().unwrap(), OutputFormat::WebP);
        assert!("gif".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::detect(&sample_png(2, 2)), Some(OutputFormat::Png));
    }

    #[test]
    fn test_transform_bytes() {
        let out = transform_bytes(&sample_png(40, 20), Some(10), None, OutputFormat::Jpeg, 70).unwrap();
        assert_eq!(OutputFormat::detect(&out), Some(OutputFormat::Jpeg));
        let img = image::load_from_memory(&out).unwrap();
        assert_eq!((img.width(), img.height()), (10, 5));
    }

    #[tokio::test]
    async fn test_save_and_read_upload() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir, 1024 * 1024);
        let user = Uuid::new_v4();

        let stored = storage
            .save_upload(user, "beach day.png", "image/png", sample_png(40, 20))
            .await
            .unwrap();
        assert_eq!((stored.width, stored.height), (40, 20));
        assert!(stored.original.starts_with(&format!("/api/storage/uploads/{}/", user)));
        assert!(stored.thumbnail.starts_with(&format!("/api/storage/thumbnails/{}/", user)));
        assert!(stored.original.ends_with("-beach_day.png"));

        let name = stored.original.rsplit('/').next().unwrap();
        assert!(!storage.read_original(user, name).await.unwrap().is_empty());

        let thumb = storage.read_thumbnail(user, name).await.unwrap();
        let thumb = image::load_from_memory(&thumb).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (16, 16));

        // Another user cannot see it
        let other = storage.read_original(Uuid::new_v4(), name).await;
        assert!(matches!(other, Err(GalleryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_same_name_uploads_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir, 1024 * 1024);
        let user = Uuid::new_v4();

        let first = storage
            .save_upload(user, "cat.png", "image/png", sample_png(4, 4))
            .await
            .unwrap();
        let second = storage
            .save_upload(user, "cat.png", "image/png", sample_png(8, 8))
            .await
            .unwrap();
        assert_ne!(first.original, second.original);

        let name = first.original.rsplit('/').next().unwrap();
        let bytes = storage.read_original(user, name).await.unwrap();
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!(img.width(), 4);
    }

    #[tokio::test]
    async fn test_delete_upload() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir, 1024 * 1024);
        let user = Uuid::new_v4();

        let stored = storage
            .save_upload(user, "gone.png", "image/png", sample_png(4, 4))
            .await
            .unwrap();
        let name = stored.original.rsplit('/').next().unwrap();

        storage.delete_upload(user, name).await.unwrap();
        assert!(matches!(
            storage.read_original(user, name).await,
            Err(GalleryError::NotFound(_))
        ));
        assert!(matches!(
            storage.read_thumbnail(user, name).await,
            Err(GalleryError::NotFound(_))
        ));

        // Deleting again is a no-op
        assert!(storage.delete_upload(user, name).await.is_ok());
        assert!(storage.delete_upload(user, "../x").await.is_err());
    }

    #[tokio::test]
    async fn test_upload_rejections() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir, 64);
        let user = Uuid::new_v4();

        let too_big = storage
            .save_upload(user, "a.png", "image/png", vec![0u8; 65])
            .await;
        assert!(matches!(too_big, Err(GalleryError::InvalidInput(_))));

        let storage = self::storage(&dir, 1024 * 1024);
        let wrong_type = storage
            .save_upload(user, "a.gif", "image/gif", sample_png(2, 2))
            .await;
        assert!(matches!(wrong_type, Err(GalleryError::InvalidInput(_))));

        let not_an_image = storage
            .save_upload(user, "a.png", "image/png", b"hello".to_vec())
            .await;
        assert!(matches!(not_an_image, Err(GalleryError::InvalidInput(_))));
    }

    #[test]
    fn test_transform_rejects_bad_parameters_before_io() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir, 1024);

        let bad_format = TransformQuery {
            format: Some("bmp".to_string()),
            ..Default::default()
        };
        let result = tokio_test::block_on(storage.transform(Uuid::new_v4(), "missing.png", bad_format));
        assert!(matches!(result, Err(GalleryError::InvalidInput(_))));

        let bad_quality = TransformQuery {
            quality: Some(0),
            ..Default::default()
        };
        let result = tokio_test::block_on(storage.transform(Uuid::new_v4(), "missing.png", bad_quality));
        assert!(matches!(result, Err(GalleryError::InvalidInput(_))));
    }
}

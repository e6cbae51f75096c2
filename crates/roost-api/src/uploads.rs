use std::path::PathBuf;

use anyhow::Result;
use axum::extract::Multipart;
use serde::de::DeserializeOwned;
use tokio::fs;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::ApiError;

/// At most this many images per listing request.
pub const MAX_IMAGES: usize = 10;

/// 10 MB per image
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// Listing images on local disk, served statically under `/uploads`.
///
/// Each image is stored flat as `{dir}/{uuid}.{ext}`; only the file name is
/// recorded on the listing.
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Image storage directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    pub async fn save(&self, image: &UploadedImage) -> Result<String> {
        let name = format!("{}.{}", Uuid::new_v4(), image.extension);
        fs::write(self.dir.join(&name), &image.bytes).await?;
        Ok(name)
    }

    /// Save every image; on failure, remove the ones already written.
    pub async fn save_all(&self, images: &[UploadedImage]) -> Result<Vec<String>, ApiError> {
        let mut saved = Vec::with_capacity(images.len());
        for image in images {
            match self.save(image).await {
                Ok(name) => saved.push(name),
                Err(e) => {
                    error!("Failed to store image: {}", e);
                    self.delete_all(&saved).await;
                    return Err(ApiError::Internal(e));
                }
            }
        }
        Ok(saved)
    }

    /// Best-effort removal; a missing file is not an error.
    pub async fn delete_all(&self, names: &[String]) {
        for name in names {
            // Stored names are generated by us, never a path.
            if name.contains('/') || name.contains('\\') || name.starts_with('.') {
                warn!("Refusing to delete suspicious image name '{}'", name);
                continue;
            }
            if let Err(e) = fs::remove_file(self.dir.join(name)).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to delete image {}: {}", name, e);
                }
            }
        }
    }
}

#[derive(Debug)]
pub struct UploadedImage {
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// A listing form: a JSON `data` part plus up to [`MAX_IMAGES`] `images` parts.
pub struct ItemForm<T> {
    pub data: Option<T>,
    pub images: Vec<UploadedImage>,
}

fn image_extension(file_name: Option<&str>) -> Result<String, ApiError> {
    file_name
        .and_then(|n| n.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| {
            ApiError::Validation(format!(
                "images must be one of: {}",
                ALLOWED_EXTENSIONS.join(", ")
            ))
        })
}

pub async fn read_item_form<T: DeserializeOwned>(mut multipart: Multipart) -> Result<ItemForm<T>, ApiError> {
    let malformed = |e: axum::extract::multipart::MultipartError| {
        ApiError::Validation(format!("malformed multipart body: {}", e))
    };

    let mut data = None;
    let mut images = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "data" => {
                let text = field.text().await.map_err(malformed)?;
                let parsed = serde_json::from_str(&text)
                    .map_err(|e| ApiError::Validation(format!("invalid listing data: {}", e)))?;
                data = Some(parsed);
            }
            "images" => {
                if images.len() >= MAX_IMAGES {
                    return Err(ApiError::Validation(format!(
                        "at most {} images per listing",
                        MAX_IMAGES
                    )));
                }
                let extension = image_extension(field.file_name())?;
                let bytes = field.bytes().await.map_err(malformed)?;
                if bytes.is_empty() {
                    return Err(ApiError::Validation("empty image upload".into()));
                }
                if bytes.len() > MAX_IMAGE_SIZE {
                    return Err(ApiError::PayloadTooLarge(format!(
                        "images must be at most {} MB",
                        MAX_IMAGE_SIZE / (1024 * 1024)
                    )));
                }
                images.push(UploadedImage {
                    extension,
                    bytes: bytes.to_vec(),
                });
            }
            other => {
                warn!("Ignoring unexpected multipart field '{}'", other);
            }
        }
    }

    Ok(ItemForm { data, images })
}

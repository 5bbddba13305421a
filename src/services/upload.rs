//! Cover image upload
//!
//! Images are checked locally (type and size) before any request. A valid
//! image is uploaded in two requests: a presigned URL from the API, then
//! the raw bytes to object storage.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use crate::api::ApiClient;
use crate::config::StorageConfig;
use crate::models::ImageFile;

use super::UploadError;

pub struct ImageUploader {
    api: Arc<ApiClient>,
    config: StorageConfig,
}

impl std::fmt::Debug for ImageUploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUploader")
            .field("bucket", &self.config.bucket)
            .finish()
    }
}

impl ImageUploader {
    pub fn new(api: Arc<ApiClient>, config: StorageConfig) -> Self {
        Self { api, config }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Reject non-images and images over the size limit
    pub fn check(&self, image: &ImageFile) -> Result<(), UploadError> {
        if !self.config.is_type_allowed(&image.content_type) {
            return Err(UploadError::UnsupportedType(image.content_type.clone()));
        }

        if image.size() > self.config.max_image_size {
            return Err(UploadError::TooLarge {
                size: image.size(),
                max: self.config.max_image_size,
            });
        }

        Ok(())
    }

    /// Object name for a new course cover: `<unix-millis>-<title>.<subtype>`
    pub fn new_object_name(&self, title: &str, content_type: &str) -> String {
        object_name_at(Utc::now().timestamp_millis(), title, self.config.get_extension(content_type))
    }

    /// Check, presign and upload `image` as `object_name`
    pub async fn upload(&self, image: &ImageFile, object_name: &str) -> Result<(), UploadError> {
        self.check(image)?;

        let presigned = self
            .api
            .presign_upload(object_name, &image.content_type, &self.config.bucket)
            .await
            .map_err(UploadError::Presign)?;

        debug!("Uploading {} ({} bytes)", object_name, image.size());

        self.api
            .upload_object(&presigned.url, &image.content_type, image.bytes.clone())
            .await
            .map_err(UploadError::Transfer)?;

        info!("Uploaded cover image {}", object_name);
        Ok(())
    }
}

fn object_name_at(millis: i64, title: &str, extension: &str) -> String {
    format!("{}-{}.{}", millis, title.trim(), extension)
}

//! Object storage endpoints
//!
//! Uploads are two requests: the API hands out a presigned PUT URL for a
//! given object name, then the raw bytes go straight to object storage.
//! The second request is not an API call, so it carries no bearer token.

use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use super::{endpoints, ApiClient, ApiError};
use crate::models::{PresignRequest, PresignResponse};

impl ApiClient {
    /// Ask the API for a presigned upload URL
    pub async fn presign_upload(
        &self,
        file_name: &str,
        file_type: &str,
        bucket: &str,
    ) -> Result<PresignResponse, ApiError> {
        let body = PresignRequest {
            file_name: file_name.to_string(),
            file_type: file_type.to_string(),
            bucket: bucket.to_string(),
        };
        self.post(endpoints::PUT_OBJECT, &body).await
    }

    /// PUT raw bytes to a presigned URL
    pub async fn upload_object(&self, url: &str, content_type: &str, bytes: Vec<u8>) -> Result<(), ApiError> {
        debug!("PUT {} ({} bytes)", url, bytes.len());

        let response = self
            .http
            .put(url)
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await?;
            return Err(ApiError::from_body(status.as_u16(), &body));
        }

        Ok(())
    }
}

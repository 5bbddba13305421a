//! Object storage upload types

use serde::{Deserialize, Serialize};

/// Request body for a presigned PUT URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignRequest {
    pub file_name: String,
    pub file_type: String,
    pub bucket: String,
}

/// Presigned, time-limited upload URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresignResponse {
    pub url: String,
}

/// A local image file picked for upload
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    /// Original file name on disk
    pub name: String,
    /// MIME type, e.g. `image/png`
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

impl std::fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFile")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

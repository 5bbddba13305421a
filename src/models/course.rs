//! Course model
//!
//! A course is the top-level entity a creator owns. Its cover image lives in
//! object storage; the course only stores the object name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::order::Ordered;

/// Publication status, transmitted as a boolean (`true` = published)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "bool", into = "bool")]
pub enum CourseStatus {
    Published,
    #[default]
    Unpublished,
}

impl From<bool> for CourseStatus {
    fn from(value: bool) -> Self {
        if value {
            Self::Published
        } else {
            Self::Unpublished
        }
    }
}

impl From<CourseStatus> for bool {
    fn from(status: CourseStatus) -> Self {
        status == CourseStatus::Published
    }
}

impl fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Published => write!(f, "published"),
            Self::Unpublished => write!(f, "unpublished"),
        }
    }
}

/// Course entity as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Price in rupees; zero means free
    #[serde(deserialize_with = "number_or_string")]
    pub price: f64,
    /// Duration in hours
    #[serde(default, deserialize_with = "number_or_string")]
    pub duration: f64,
    /// Object-storage file name of the cover image
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub highlights: String,
    #[serde(default)]
    pub outcomes: String,
    #[serde(default)]
    pub prerequisites: String,
    #[serde(default)]
    pub status: CourseStatus,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub creator_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    pub fn is_free(&self) -> bool {
        self.price <= 0.0
    }

    /// Editable fields of this course, used to prefill the edit form
    pub fn to_input(&self) -> CourseInput {
        CourseInput {
            title: self.title.clone(),
            description: self.description.clone(),
            price: self.price,
            duration: self.duration,
            image: self.image.clone(),
            highlights: self.highlights.clone(),
            outcomes: self.outcomes.clone(),
            prerequisites: self.prerequisites.clone(),
            status: self.status,
        }
    }
}

impl Ordered for Course {
    fn id(&self) -> i64 {
        self.id
    }

    fn order(&self) -> i32 {
        self.order
    }

    fn set_order(&mut self, order: i32) {
        self.order = order;
    }
}

/// Payload for creating or updating a course
///
/// The id of an update travels in the request path, never in the body.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseInput {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub duration: f64,
    pub image: String,
    pub highlights: String,
    pub outcomes: String,
    pub prerequisites: String,
    pub status: CourseStatus,
}

/// Response of create/update/delete
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseResponse {
    pub message: String,
    pub course: Course,
}

/// `GET /course/own`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseList {
    pub courses: Vec<Course>,
}

/// `GET /course/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseEnvelope {
    pub course: Course,
}

/// Accept both `499` and `"499"`; the API is inconsistent about numeric fields.
fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) if s.trim().is_empty() => Ok(0.0),
        Raw::Text(s) => s.trim().parse::<f64>().map_err(serde::de::Error::custom),
    }
}

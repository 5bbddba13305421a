//! Lesson model
//!
//! A lesson is a leaf content unit: either a video or a task. Unlocked
//! lessons carry a public resource whose URL anyone can open.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::order::Ordered;

/// Lesson type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonKind {
    Video,
    Task,
}

impl std::fmt::Display for LessonKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Task => write!(f, "task"),
        }
    }
}

impl std::str::FromStr for LessonKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "video" => Ok(Self::Video),
            "task" => Ok(Self::Task),
            _ => Err(anyhow::anyhow!("Invalid lesson type: {}", s)),
        }
    }
}

/// Public-access visibility of a lesson
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Anyone can open the lesson through its public URL
    Unlock,
    /// Only enrolled students can open the lesson
    Lock,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unlock => write!(f, "unlock"),
            Self::Lock => write!(f, "lock"),
        }
    }
}

impl std::str::FromStr for Visibility {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unlock" | "public" => Ok(Self::Unlock),
            "lock" | "private" => Ok(Self::Lock),
            _ => Err(anyhow::anyhow!("Invalid visibility: {}", s)),
        }
    }
}

/// Publicly reachable resource of an unlocked lesson
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicResource {
    pub id: i64,
    pub lesson_id: i64,
    pub url: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Linked video or task resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonResource {
    pub id: i64,
    pub lesson_id: i64,
    pub resource_id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Lesson entity as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub order: i32,
    pub module_id: i64,
    pub is_video: bool,
    #[serde(default)]
    pub public: Option<PublicResource>,
    #[serde(default)]
    pub video: Option<LessonResource>,
    #[serde(default)]
    pub tasks: Vec<LessonResource>,
}

impl Lesson {
    pub fn kind(&self) -> LessonKind {
        if self.is_video {
            LessonKind::Video
        } else {
            LessonKind::Task
        }
    }

    pub fn visibility(&self) -> Visibility {
        if self.public.is_some() {
            Visibility::Unlock
        } else {
            Visibility::Lock
        }
    }

    pub fn public_url(&self) -> Option<&str> {
        self.public.as_ref().map(|p| p.url.as_str())
    }
}

impl Ordered for Lesson {
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

/// Payload for creating or updating a lesson
///
/// `url` is the empty string for locked lessons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonInput {
    pub title: String,
    pub is_video: bool,
    pub module_id: i64,
    pub url: String,
}

/// Response of create/update/delete
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonResponse {
    pub message: String,
    pub lesson: Lesson,
}

/// `GET /course/lessons/{moduleId}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonList {
    pub lessons: Vec<Lesson>,
}

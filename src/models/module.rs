//! Course module model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::lesson::Lesson;
use super::order::Ordered;

/// An ordered grouping of lessons within a course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseModule {
    pub id: i64,
    pub title: String,
    /// Missing on freshly created modules; the service assigns the next slot
    #[serde(default)]
    pub order: i32,
    pub course_id: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

impl Ordered for CourseModule {
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

/// Payload for creating or updating a module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleInput {
    pub course_id: i64,
    pub title: String,
}

/// Response of create/update/delete
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleResponse {
    pub message: String,
    pub module: CourseModule,
}

/// `GET /course/module/{courseId}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleList {
    pub modules: Vec<CourseModule>,
}

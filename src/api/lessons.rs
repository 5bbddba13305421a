//! Lesson endpoints

use super::{endpoints, ApiClient, ApiError};
use crate::models::{Lesson, LessonInput, LessonList, LessonResponse, MessageResponse, OrderUpdate};

impl ApiClient {
    pub async fn fetch_module_lessons(&self, module_id: i64) -> Result<Vec<Lesson>, ApiError> {
        let list: LessonList = self.get(&format!("{}/{}", endpoints::MODULE_LESSONS, module_id)).await?;
        Ok(list.lessons)
    }

    pub async fn create_lesson(&self, input: &LessonInput) -> Result<LessonResponse, ApiError> {
        self.post(endpoints::LESSON, input).await
    }

    pub async fn update_lesson(&self, id: i64, input: &LessonInput) -> Result<LessonResponse, ApiError> {
        self.put(&format!("{}/{}", endpoints::LESSON, id), input).await
    }

    pub async fn delete_lesson(&self, id: i64) -> Result<LessonResponse, ApiError> {
        self.delete(&format!("{}/{}", endpoints::LESSON, id)).await
    }

    pub async fn update_lesson_order(&self, batch: &[OrderUpdate]) -> Result<MessageResponse, ApiError> {
        self.put(endpoints::LESSON_ORDER, batch).await
    }
}

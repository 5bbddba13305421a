//! Course endpoints

use super::{endpoints, ApiClient, ApiError};
use crate::models::{
    Course, CourseEnvelope, CourseInput, CourseList, CourseResponse, MessageResponse, OrderUpdate,
};

impl ApiClient {
    /// Courses owned by the authenticated creator
    pub async fn fetch_own_courses(&self) -> Result<Vec<Course>, ApiError> {
        let list: CourseList = self.get(endpoints::COURSE_OWN).await?;
        Ok(list.courses)
    }

    pub async fn fetch_course(&self, id: i64) -> Result<Course, ApiError> {
        let envelope: CourseEnvelope = self.get(&format!("{}/{}", endpoints::COURSE, id)).await?;
        Ok(envelope.course)
    }

    pub async fn create_course(&self, input: &CourseInput) -> Result<CourseResponse, ApiError> {
        self.post(endpoints::COURSE, input).await
    }

    pub async fn update_course(&self, id: i64, input: &CourseInput) -> Result<CourseResponse, ApiError> {
        self.put(&format!("{}/{}", endpoints::COURSE, id), input).await
    }

    pub async fn delete_course(&self, id: i64) -> Result<CourseResponse, ApiError> {
        self.delete(&format!("{}/{}", endpoints::COURSE, id)).await
    }

    pub async fn update_course_order(&self, batch: &[OrderUpdate]) -> Result<MessageResponse, ApiError> {
        self.put(endpoints::COURSE_ORDER, batch).await
    }
}

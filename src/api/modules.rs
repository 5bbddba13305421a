//! Course module endpoints

use super::{endpoints, ApiClient, ApiError};
use crate::models::{CourseModule, MessageResponse, ModuleInput, ModuleList, ModuleResponse, OrderUpdate};

impl ApiClient {
    /// Modules of a course, with their lessons when the server embeds them
    pub async fn fetch_course_modules(&self, course_id: i64) -> Result<Vec<CourseModule>, ApiError> {
        let list: ModuleList = self.get(&format!("{}/{}", endpoints::MODULE, course_id)).await?;
        Ok(list.modules)
    }

    pub async fn create_module(&self, input: &ModuleInput) -> Result<ModuleResponse, ApiError> {
        self.post(endpoints::MODULE, input).await
    }

    pub async fn update_module(&self, id: i64, input: &ModuleInput) -> Result<ModuleResponse, ApiError> {
        self.put(&format!("{}/{}", endpoints::MODULE, id), input).await
    }

    pub async fn delete_module(&self, id: i64) -> Result<ModuleResponse, ApiError> {
        self.delete(&format!("{}/{}", endpoints::MODULE, id)).await
    }

    pub async fn update_module_order(&self, batch: &[OrderUpdate]) -> Result<MessageResponse, ApiError> {
        self.put(endpoints::MODULE_ORDER, batch).await
    }
}

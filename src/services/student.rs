//! Student roster (read-only)

use std::sync::Arc;

use crate::api::ApiClient;
use crate::cache::{QueryCache, QueryKey};
use crate::models::Student;

use super::notify::Notifier;
use super::ServiceError;

#[derive(Debug)]
pub struct StudentService {
    api: Arc<ApiClient>,
    cache: Arc<QueryCache>,
    notifier: Arc<Notifier>,
}

impl StudentService {
    pub fn new(api: Arc<ApiClient>, cache: Arc<QueryCache>, notifier: Arc<Notifier>) -> Self {
        Self { api, cache, notifier }
    }

    pub async fn list(&self) -> Result<Vec<Student>, ServiceError> {
        if let Some(students) = self.cache.get::<Vec<Student>>(&QueryKey::Students).await? {
            return Ok(students);
        }

        let students = self.api.fetch_students().await.map_err(|e| self.notifier.fail(e))?;
        self.cache.set(&QueryKey::Students, &students).await?;
        Ok(students)
    }
}

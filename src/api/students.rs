//! Student roster endpoint

use super::{endpoints, ApiClient, ApiError};
use crate::models::{Student, StudentList};

impl ApiClient {
    pub async fn fetch_students(&self) -> Result<Vec<Student>, ApiError> {
        let list: StudentList = self.get(endpoints::USERS).await?;
        Ok(list.users)
    }
}

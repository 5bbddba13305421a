//! Module service
//!
//! CRUD over the modules of one course. Cached lists live under
//! `modules:<courseId>` and are patched after each confirmed mutation.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::cache::{QueryCache, QueryKey};
use crate::models::{CourseModule, ModuleInput, Ordered};

use super::mutation::Mutation;
use super::notify::Notifier;
use super::reorder::{Collection, ReorderBoard};
use super::validation::{rule, Constraint, Rule, Validate};
use super::ServiceError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleForm {
    pub title: String,
}

impl ModuleForm {
    pub fn from_module(module: &CourseModule) -> Self {
        Self {
            title: module.title.clone(),
        }
    }
}

impl Validate for ModuleForm {
    fn rules() -> &'static [Rule] {
        const RULES: &[Rule] = &[
            rule("title", Constraint::MinLen(2), "Module must be at least 2 characters."),
            rule("title", Constraint::MaxLen(100), "Module must be less than 100 characters."),
        ];
        RULES
    }

    fn value(&self, _field: &str) -> String {
        self.title.trim().to_string()
    }
}

pub struct ModuleService {
    api: Arc<ApiClient>,
    cache: Arc<QueryCache>,
    notifier: Arc<Notifier>,
    submit: Mutation,
}

impl std::fmt::Debug for ModuleService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleService").finish_non_exhaustive()
    }
}

impl ModuleService {
    pub fn new(api: Arc<ApiClient>, cache: Arc<QueryCache>, notifier: Arc<Notifier>) -> Self {
        Self {
            api,
            cache,
            notifier,
            submit: Mutation::new(),
        }
    }

    pub async fn list(&self, course_id: i64) -> Result<Vec<CourseModule>, ServiceError> {
        let key = QueryKey::Modules(course_id);
        if let Some(modules) = self.cache.get::<Vec<CourseModule>>(&key).await? {
            return Ok(modules);
        }

        let mut modules = self
            .api
            .fetch_course_modules(course_id)
            .await
            .map_err(|e| self.notifier.fail(e))?;
        modules.sort_by_key(|m| m.order());
        self.cache.set(&key, &modules).await?;
        Ok(modules)
    }

    pub async fn create(&self, course_id: i64, form: &ModuleForm) -> Result<CourseModule, ServiceError> {
        form.validate().map_err(|e| self.notifier.fail(e))?;
        let _pending = self.submit.begin()?;

        let input = ModuleInput {
            course_id,
            title: form.title.trim().to_string(),
        };
        let response = self.api.create_module(&input).await.map_err(|e| self.notifier.fail(e))?;

        let key = QueryKey::Modules(course_id);
        let mut module = response.module;
        // Fresh modules may come back without a position; they go last
        if module.order == 0 {
            let count = self
                .cache
                .get::<Vec<CourseModule>>(&key)
                .await?
                .map(|list| list.len())
                .unwrap_or(0);
            module.order = count as i32 + 1;
        }

        self.cache.insert(&key, module.clone()).await?;
        self.notifier.success(response.message);
        Ok(module)
    }

    pub async fn update(&self, course_id: i64, module_id: i64, form: &ModuleForm) -> Result<CourseModule, ServiceError> {
        form.validate().map_err(|e| self.notifier.fail(e))?;
        let _pending = self.submit.begin()?;

        let input = ModuleInput {
            course_id,
            title: form.title.trim().to_string(),
        };
        let response = self
            .api
            .update_module(module_id, &input)
            .await
            .map_err(|e| self.notifier.fail(e))?;

        let key = QueryKey::Modules(course_id);
        let mut module = response.module;
        if let Some(cached) = self
            .cache
            .get::<Vec<CourseModule>>(&key)
            .await?
            .and_then(|list| list.into_iter().find(|m| m.id == module_id))
        {
            if module.order == 0 {
                module.order = cached.order;
            }
            if module.lessons.is_empty() {
                module.lessons = cached.lessons;
            }
        }

        self.cache.replace(&key, module.clone()).await?;
        self.notifier.success(response.message);
        Ok(module)
    }

    pub async fn delete(&self, course_id: i64, module_id: i64) -> Result<CourseModule, ServiceError> {
        let response = self.api.delete_module(module_id).await.map_err(|e| self.notifier.fail(e))?;

        self.cache.remove::<CourseModule>(&QueryKey::Modules(course_id), module_id).await?;
        self.cache.invalidate(&QueryKey::Lessons(module_id)).await?;

        self.notifier.success(response.message);
        Ok(response.module)
    }

    pub async fn board(&self, course_id: i64) -> Result<ReorderBoard<CourseModule>, ServiceError> {
        let modules = self.list(course_id).await?;
        Ok(ReorderBoard::new(
            Collection::Modules { course_id },
            modules,
            self.api.clone(),
            self.cache.clone(),
            self.notifier.clone(),
        ))
    }
}

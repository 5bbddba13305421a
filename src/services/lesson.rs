//! Lesson service
//!
//! CRUD over the lessons of one module, cached under `lessons:<moduleId>`.
//! An unlocked lesson needs a public URL matching its kind: a YouTube link
//! for videos, a Drive link for tasks. A locked lesson has no URL.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::cache::{QueryCache, QueryKey};
use crate::models::{Lesson, LessonInput, LessonKind, Ordered, Visibility};

use super::mutation::Mutation;
use super::notify::Notifier;
use super::reorder::{Collection, ReorderBoard};
use super::validation::{rule, Constraint, FieldError, Rule, Validate};
use super::ServiceError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonForm {
    pub title: String,
    pub kind: LessonKind,
    pub visibility: Visibility,
    pub url: String,
}

impl Default for LessonForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            kind: LessonKind::Video,
            visibility: Visibility::Lock,
            url: String::new(),
        }
    }
}

impl LessonForm {
    pub fn from_lesson(lesson: &Lesson) -> Self {
        Self {
            title: lesson.title.clone(),
            kind: lesson.kind(),
            visibility: lesson.visibility(),
            url: lesson.public_url().unwrap_or_default().to_string(),
        }
    }

    fn to_input(&self, module_id: i64) -> LessonInput {
        LessonInput {
            title: self.title.trim().to_string(),
            is_video: self.kind == LessonKind::Video,
            module_id,
            url: match self.visibility {
                Visibility::Unlock => self.url.trim().to_string(),
                Visibility::Lock => String::new(),
            },
        }
    }
}

impl Validate for LessonForm {
    fn rules() -> &'static [Rule] {
        const RULES: &[Rule] = &[
            rule("title", Constraint::MinLen(2), "Lesson must be at least 2 characters."),
            rule("title", Constraint::MaxLen(100), "Lesson must be less than 100 characters."),
            rule("url", Constraint::UrlOrEmpty, "Invalid url"),
        ];
        RULES
    }

    fn value(&self, field: &str) -> String {
        match field {
            "title" => self.title.trim().to_string(),
            "url" => self.url.trim().to_string(),
            _ => String::new(),
        }
    }

    fn refine(&self, errors: &mut Vec<FieldError>) {
        let url = self.url.trim();

        match self.visibility {
            Visibility::Unlock if url.is_empty() => {
                errors.push(FieldError::new("url", "URL is required when visibility is set to 'unlock'."));
            }
            Visibility::Unlock => {
                let matches_kind = match self.kind {
                    LessonKind::Video => url.contains("youtu"),
                    LessonKind::Task => url.contains("drive"),
                };
                if !matches_kind {
                    errors.push(FieldError::new("url", "Type of lesson and URL not match, enter valid URL."));
                }
            }
            Visibility::Lock if !url.is_empty() => {
                errors.push(FieldError::new("url", "URL must be empty when visibility is set to 'lock'."));
            }
            Visibility::Lock => {}
        }
    }
}

pub struct LessonService {
    api: Arc<ApiClient>,
    cache: Arc<QueryCache>,
    notifier: Arc<Notifier>,
    submit: Mutation,
}

impl std::fmt::Debug for LessonService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LessonService").finish_non_exhaustive()
    }
}

impl LessonService {
    pub fn new(api: Arc<ApiClient>, cache: Arc<QueryCache>, notifier: Arc<Notifier>) -> Self {
        Self {
            api,
            cache,
            notifier,
            submit: Mutation::new(),
        }
    }

    pub async fn list(&self, module_id: i64) -> Result<Vec<Lesson>, ServiceError> {
        let key = QueryKey::Lessons(module_id);
        if let Some(lessons) = self.cache.get::<Vec<Lesson>>(&key).await? {
            return Ok(lessons);
        }

        let mut lessons = self
            .api
            .fetch_module_lessons(module_id)
            .await
            .map_err(|e| self.notifier.fail(e))?;
        lessons.sort_by_key(|l| l.order());
        self.cache.set(&key, &lessons).await?;
        Ok(lessons)
    }

    pub async fn get(&self, module_id: i64, lesson_id: i64) -> Result<Option<Lesson>, ServiceError> {
        Ok(self.list(module_id).await?.into_iter().find(|l| l.id == lesson_id))
    }

    pub async fn create(&self, module_id: i64, form: &LessonForm) -> Result<Lesson, ServiceError> {
        form.validate().map_err(|e| self.notifier.fail(e))?;
        let _pending = self.submit.begin()?;

        let response = self
            .api
            .create_lesson(&form.to_input(module_id))
            .await
            .map_err(|e| self.notifier.fail(e))?;

        self.cache.insert(&QueryKey::Lessons(module_id), response.lesson.clone()).await?;
        self.notifier.success(response.message);
        Ok(response.lesson)
    }

    pub async fn update(&self, module_id: i64, lesson_id: i64, form: &LessonForm) -> Result<Lesson, ServiceError> {
        form.validate().map_err(|e| self.notifier.fail(e))?;
        let _pending = self.submit.begin()?;

        let response = self
            .api
            .update_lesson(lesson_id, &form.to_input(module_id))
            .await
            .map_err(|e| self.notifier.fail(e))?;

        self.cache.replace(&QueryKey::Lessons(module_id), response.lesson.clone()).await?;
        self.notifier.success(response.message);
        Ok(response.lesson)
    }

    pub async fn delete(&self, module_id: i64, lesson_id: i64) -> Result<Lesson, ServiceError> {
        let response = self.api.delete_lesson(lesson_id).await.map_err(|e| self.notifier.fail(e))?;

        self.cache.remove::<Lesson>(&QueryKey::Lessons(module_id), lesson_id).await?;
        self.notifier.success(response.message);
        Ok(response.lesson)
    }

    pub async fn board(&self, module_id: i64) -> Result<ReorderBoard<Lesson>, ServiceError> {
        let lessons = self.list(module_id).await?;
        Ok(ReorderBoard::new(
            Collection::Lessons { module_id },
            lessons,
            self.api.clone(),
            self.cache.clone(),
            self.notifier.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(kind: LessonKind, visibility: Visibility, url: &str) -> LessonForm {
        LessonForm {
            title: "Why docker?".into(),
            kind,
            visibility,
            url: url.into(),
        }
    }

    #[test]
    fn test_unlocked_video_needs_youtube_url() {
        assert!(form(LessonKind::Video, Visibility::Unlock, "https://youtu.be/abc").validate().is_ok());

        let err = form(LessonKind::Video, Visibility::Unlock, "https://drive.google.com/x")
            .validate()
            .unwrap_err();
        assert_eq!(err.for_field("url"), vec!["Type of lesson and URL not match, enter valid URL."]);
    }

    #[test]
    fn test_unlocked_task_needs_drive_url() {
        assert!(form(LessonKind::Task, Visibility::Unlock, "https://drive.google.com/file/d/1").validate().is_ok());
        assert!(form(LessonKind::Task, Visibility::Unlock, "https://youtu.be/abc").validate().is_err());
    }

    #[test]
    fn test_unlock_requires_url() {
        let err = form(LessonKind::Video, Visibility::Unlock, "").validate().unwrap_err();
        assert_eq!(err.for_field("url"), vec!["URL is required when visibility is set to 'unlock'."]);
    }

    #[test]
    fn test_lock_forbids_url() {
        assert!(form(LessonKind::Task, Visibility::Lock, "").validate().is_ok());
        assert!(form(LessonKind::Task, Visibility::Lock, "https://drive.google.com/x").validate().is_err());
    }

    #[test]
    fn test_invalid_url() {
        let err = form(LessonKind::Video, Visibility::Unlock, "youtu.be/abc").validate().unwrap_err();
        assert!(err.for_field("url").contains(&"Invalid url"));
    }

    #[test]
    fn test_to_input() {
        let input = form(LessonKind::Task, Visibility::Unlock, " https://drive.google.com/x ").to_input(4);
        assert!(!input.is_video);
        assert_eq!(input.module_id, 4);
        assert_eq!(input.url, "https://drive.google.com/x");

        let locked = form(LessonKind::Video, Visibility::Lock, "").to_input(4);
        assert_eq!(locked.url, "");
    }
}

//! Course service
//!
//! This module handles course management:
//! - Listing the creator's courses (cached, in display order)
//! - The two-step create/edit form with cover image upload
//! - Deleting a course and dropping its cached modules and lessons
//! - Handing out a reorder board for the course list

use std::sync::Arc;
use tracing::info;

use crate::api::ApiClient;
use crate::cache::{QueryCache, QueryKey};
use crate::models::{Course, CourseInput, CourseModule, CourseStatus, ImageFile, Ordered};

use super::mutation::Mutation;
use super::notify::Notifier;
use super::reorder::{Collection, ReorderBoard};
use super::upload::ImageUploader;
use super::validation::{rule, Constraint, Rule, Validate};
use super::{ServiceError, UploadError};

/// Whether a form creates a new entity or edits an existing one
#[derive(Debug, Clone, PartialEq)]
pub enum Mode<T> {
    Create,
    Edit(T),
}

impl<T> Mode<T> {
    pub fn is_create(&self) -> bool {
        matches!(self, Mode::Create)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorStep {
    /// Title, description, price, duration, cover image
    Details,
    /// Highlights, outcomes, prerequisites
    Extras,
}

/// Raw form fields as typed by the creator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseDraft {
    pub title: String,
    pub description: String,
    pub price: String,
    pub duration: String,
    pub highlights: String,
    pub outcomes: String,
    pub prerequisites: String,
    pub status: CourseStatus,
}

impl CourseDraft {
    fn from_input(input: &CourseInput) -> Self {
        Self {
            title: input.title.clone(),
            description: input.description.clone(),
            price: input.price.to_string(),
            duration: input.duration.to_string(),
            highlights: input.highlights.clone(),
            outcomes: input.outcomes.clone(),
            prerequisites: input.prerequisites.clone(),
            status: input.status,
        }
    }

    /// Price as sent to the server; an empty field means free
    fn price_value(&self) -> String {
        zero_if_empty(&self.price)
    }

    fn duration_value(&self) -> String {
        zero_if_empty(&self.duration)
    }

    fn to_input(&self, image: String) -> CourseInput {
        CourseInput {
            title: self.title.trim().to_string(),
            description: self.description.clone(),
            price: self.price_value().parse().unwrap_or(0.0),
            duration: self.duration_value().parse().unwrap_or(0.0),
            image,
            highlights: self.highlights.clone(),
            outcomes: self.outcomes.clone(),
            prerequisites: self.prerequisites.clone(),
            status: self.status,
        }
    }
}

fn zero_if_empty(field: &str) -> String {
    match field.trim() {
        "" => "0".to_string(),
        value => value.to_string(),
    }
}

/// Create/edit form state for one course
#[derive(Debug, Clone)]
pub struct CourseEditor {
    mode: Mode<Course>,
    step: EditorStep,
    pub draft: CourseDraft,
    image: Option<ImageFile>,
}

impl CourseEditor {
    pub fn new(mode: Mode<Course>) -> Self {
        let draft = match &mode {
            Mode::Create => CourseDraft::default(),
            Mode::Edit(course) => CourseDraft::from_input(&course.to_input()),
        };

        Self {
            mode,
            step: EditorStep::Details,
            draft,
            image: None,
        }
    }

    pub fn mode(&self) -> &Mode<Course> {
        &self.mode
    }

    pub fn step(&self) -> EditorStep {
        self.step
    }

    pub fn next_step(&mut self) {
        self.step = EditorStep::Extras;
    }

    pub fn previous_step(&mut self) {
        self.step = EditorStep::Details;
    }

    /// Pick a new cover image; non-images are refused right away
    pub fn set_image(&mut self, image: ImageFile) -> Result<(), UploadError> {
        if !image.content_type.starts_with("image/") {
            self.image = None;
            return Err(UploadError::UnsupportedType(image.content_type));
        }
        self.image = Some(image);
        Ok(())
    }

    pub fn image(&self) -> Option<&ImageFile> {
        self.image.as_ref()
    }

    fn existing_image(&self) -> &str {
        match &self.mode {
            Mode::Edit(course) => &course.image,
            Mode::Create => "",
        }
    }

    /// Clear every field and return to the first step
    pub fn discard(&mut self) {
        self.draft = CourseDraft::default();
        self.image = None;
        self.step = EditorStep::Details;
    }
}

impl Validate for CourseEditor {
    fn rules() -> &'static [Rule] {
        const RULES: &[Rule] = &[
            rule("title", Constraint::MinLen(1), "Title is required"),
            rule("title", Constraint::MaxLen(70), "maximum 70 character is allow."),
            rule("description", Constraint::MinLen(1), "Description is required"),
            rule("price", Constraint::NonNegative, "Price must be a positive number or zero for free"),
            rule("duration", Constraint::NonNegative, "Duration must be a number of hours"),
            rule("highlights", Constraint::MinLen(1), "Highlights are required"),
            rule("outcomes", Constraint::MinLen(1), "Outcomes are required"),
            rule("prerequisites", Constraint::MinLen(1), "Prerequisites are required"),
            rule("image", Constraint::MinLen(1), "Cover image is required"),
        ];
        RULES
    }

    fn value(&self, field: &str) -> String {
        match field {
            "title" => self.draft.title.trim().to_string(),
            "description" => self.draft.description.clone(),
            "price" => self.draft.price_value(),
            "duration" => self.draft.duration_value(),
            "highlights" => self.draft.highlights.clone(),
            "outcomes" => self.draft.outcomes.clone(),
            "prerequisites" => self.draft.prerequisites.clone(),
            "image" => match &self.image {
                Some(image) => image.name.clone(),
                None => self.existing_image().to_string(),
            },
            _ => String::new(),
        }
    }
}

pub struct CourseService {
    api: Arc<ApiClient>,
    cache: Arc<QueryCache>,
    notifier: Arc<Notifier>,
    uploader: ImageUploader,
    submit: Mutation,
}

impl std::fmt::Debug for CourseService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CourseService").finish_non_exhaustive()
    }
}

impl CourseService {
    pub fn new(api: Arc<ApiClient>, cache: Arc<QueryCache>, notifier: Arc<Notifier>, uploader: ImageUploader) -> Self {
        Self {
            api,
            cache,
            notifier,
            uploader,
            submit: Mutation::new(),
        }
    }

    pub fn uploader(&self) -> &ImageUploader {
        &self.uploader
    }

    /// The creator's courses in display order
    pub async fn list(&self) -> Result<Vec<Course>, ServiceError> {
        if let Some(courses) = self.cache.get::<Vec<Course>>(&QueryKey::Courses).await? {
            return Ok(courses);
        }

        let mut courses = self.api.fetch_own_courses().await.map_err(|e| self.notifier.fail(e))?;
        courses.sort_by_key(|c| c.order());
        self.cache.set(&QueryKey::Courses, &courses).await?;
        Ok(courses)
    }

    pub async fn get(&self, id: i64) -> Result<Course, ServiceError> {
        if let Some(course) = self.cache.get::<Course>(&QueryKey::Course(id)).await? {
            return Ok(course);
        }

        let course = self.api.fetch_course(id).await.map_err(|e| self.notifier.fail(e))?;
        self.cache.set(&QueryKey::Course(id), &course).await?;
        Ok(course)
    }

    /// Validate, upload the cover image if needed, then create or update
    pub async fn submit(&self, editor: &mut CourseEditor) -> Result<Course, ServiceError> {
        editor.validate().map_err(|e| self.notifier.fail(e))?;
        let _pending = self.submit.begin()?;

        let image_name = match (&editor.mode, &editor.image) {
            // Unchanged cover image: no upload
            (Mode::Edit(course), None) => course.image.clone(),
            (Mode::Create, None) => return Err(self.notifier.fail(UploadError::MissingImage)),
            (mode, Some(image)) => {
                let name = match mode {
                    Mode::Edit(course) if !course.image.is_empty() => course.image.clone(),
                    _ => self.uploader.new_object_name(&editor.draft.title, &image.content_type),
                };
                self.uploader.upload(image, &name).await.map_err(|e| self.notifier.fail(e))?;
                name
            }
        };

        let input = editor.draft.to_input(image_name);
        let response = match &editor.mode {
            Mode::Create => self.api.create_course(&input).await,
            Mode::Edit(course) => self.api.update_course(course.id, &input).await,
        }
        .map_err(|e| self.notifier.fail(e))?;

        let course = response.course;
        if editor.mode.is_create() {
            self.cache.insert(&QueryKey::Courses, course.clone()).await?;
        } else {
            self.cache.replace(&QueryKey::Courses, course.clone()).await?;
        }
        self.cache.set(&QueryKey::Course(course.id), &course).await?;

        self.notifier.success(response.message);
        info!("Saved course {} ({})", course.id, course.title);

        editor.discard();
        Ok(course)
    }

    pub async fn delete(&self, id: i64) -> Result<Course, ServiceError> {
        let response = self.api.delete_course(id).await.map_err(|e| self.notifier.fail(e))?;

        self.cache.remove::<Course>(&QueryKey::Courses, id).await?;
        self.cache.invalidate(&QueryKey::Course(id)).await?;

        if let Some(modules) = self.cache.get::<Vec<CourseModule>>(&QueryKey::Modules(id)).await? {
            for module in modules {
                self.cache.invalidate(&QueryKey::Lessons(module.id)).await?;
            }
        }
        self.cache.invalidate(&QueryKey::Modules(id)).await?;

        self.notifier.success(response.message);
        Ok(response.course)
    }

    /// Reorder board over the current course list
    pub async fn board(&self) -> Result<ReorderBoard<Course>, ServiceError> {
        let courses = self.list().await?;
        Ok(ReorderBoard::new(
            Collection::Courses,
            courses,
            self.api.clone(),
            self.cache.clone(),
            self.notifier.clone(),
        ))
    }

    /// Editor for a new course, or prefilled from an existing one
    pub async fn editor(&self, course_id: Option<i64>) -> Result<CourseEditor, ServiceError> {
        match course_id {
            None => Ok(CourseEditor::new(Mode::Create)),
            Some(id) => Ok(CourseEditor::new(Mode::Edit(self.get(id).await?))),
        }
    }
}

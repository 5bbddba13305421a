//! Services layer - Business logic
//!
//! This module contains every dashboard workflow built on the API client.
//! Services are responsible for:
//! - Validating forms before any request is sent
//! - Calling the API and patching the request cache on success
//! - Turning every outcome into a notice for the creator

pub mod course;
pub mod error;
pub mod format;
pub mod lesson;
pub mod module;
pub mod mutation;
pub mod notify;
pub mod password_reset;
pub mod registration;
pub mod reorder;
pub mod routes;
pub mod session;
pub mod student;
pub mod upload;
pub mod validation;

pub use course::{CourseDraft, CourseEditor, CourseService, EditorStep, Mode};
pub use error::{FlowError, ServiceError, UploadError};
pub use format::{format_date, format_price, image_url};
pub use lesson::{LessonForm, LessonService};
pub use module::{ModuleForm, ModuleService};
pub use mutation::Mutation;
pub use notify::{Notice, NoticeLevel, Notifier};
pub use password_reset::{NewPasswordForm, PasswordReset, ResetState};
pub use registration::{AccountDetails, ProfileDetails, Registration, RegistrationState, RegistrationStep};
pub use reorder::{apply_move, Collection, ReorderBoard};
pub use routes::{guard, Access, Route, RouteDecision};
pub use session::{
    FileTokenStore, LoginForm, MemoryTokenStore, SessionContext, SessionState, StoreError, TokenClaims,
    TokenStore,
};
pub use student::StudentService;
pub use upload::ImageUploader;
pub use validation::{Constraint, FieldError, Rule, Validate, ValidationErrors};

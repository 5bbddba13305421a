//! Data models
//!
//! This module contains all data structures exchanged with the course API.
//! Models represent:
//! - Server entities (Course, CourseModule, Lesson, User, Student)
//! - API request/response bodies
//! - Ordering primitives shared by every sortable collection

mod auth;
mod course;
mod lesson;
mod module;
mod order;
mod upload;
mod user;

pub use auth::{
    AuthResponse, LoginRequest, RegisterRequest, ResetPasswordRequest, ResetPasswordResponse,
    SendOtpRequest, SendOtpResponse, VerifyOtpRequest, VerifyOtpResponse,
};
pub use course::{Course, CourseEnvelope, CourseInput, CourseList, CourseResponse, CourseStatus};
pub use lesson::{
    Lesson, LessonInput, LessonKind, LessonList, LessonResource, LessonResponse, PublicResource,
    Visibility,
};
pub use module::{CourseModule, ModuleInput, ModuleList, ModuleResponse};
pub use order::{MessageResponse, OrderUpdate, Ordered};
pub use upload::{ImageFile, PresignRequest, PresignResponse};
pub use user::{Student, StudentList, User};

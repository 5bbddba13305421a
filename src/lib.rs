//! coursedesk - Creator dashboard client for online courses
//!
//! This library provides everything a course creator's dashboard needs on
//! top of the remote course API: authentication flows, course/module/lesson
//! management, ordered-list reordering, cover image upload and the student
//! roster. The `coursedesk` binary is a terminal front end over it.

pub mod api;
pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod models;
pub mod services;

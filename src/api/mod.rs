//! API layer - HTTP client for the course backend
//!
//! This module contains thin async wrappers over every backend endpoint the
//! dashboard uses. It includes:
//! - Creator auth endpoints (OTP, register, login, password reset)
//! - Course, module and lesson endpoints (CRUD and order batches)
//! - Object storage presign and raw upload
//! - Student roster
//!
//! One [`ApiClient`] is shared by every service. The bearer token is
//! installed by the session on login and removed on logout.

pub mod auth;
pub mod courses;
pub mod error;
pub mod lessons;
pub mod modules;
pub mod storage;
pub mod students;

#[cfg(test)]
mod tests;

use reqwest::{Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::RwLock;
use std::time::Duration;
use tracing::debug;

use crate::config::ApiConfig;

pub use error::{ApiError, GENERIC_ERROR_MESSAGE};

/// Endpoint paths relative to the configured base URL
pub mod endpoints {
    pub const SEND_VERIFY_EMAIL: &str = "/auth/creator/send-verify-email";
    pub const VERIFY_EMAIL_OTP: &str = "/auth/verify-email-otp";
    pub const REGISTER: &str = "/auth/creator/register";
    pub const LOGIN: &str = "/auth/creator/login";
    pub const FORGOT_PASSWORD_SEND_EMAIL: &str = "/auth/creator/forgot-password/send-verify-email";
    pub const RESET_PASSWORD: &str = "/auth/creator/reset-password";
    pub const USERS: &str = "/auth/user";

    pub const COURSE: &str = "/course";
    pub const COURSE_OWN: &str = "/course/own";
    pub const COURSE_ORDER: &str = "/course/order";

    pub const MODULE: &str = "/course/module";
    pub const MODULE_ORDER: &str = "/course/module/order";

    pub const LESSON: &str = "/course/lesson";
    pub const MODULE_LESSONS: &str = "/course/lessons";
    pub const LESSON_ORDER: &str = "/course/lesson/order";

    pub const PUT_OBJECT: &str = "/s3/putObject";
}

/// Shared HTTP client for the course API
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token().is_some())
            .finish()
    }
}

impl ApiClient {
    /// Create a client with the configured base URL and timeout
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Install the bearer token sent with every following request
    pub fn set_token(&self, token: impl Into<String>) {
        if let Ok(mut guard) = self.token.write() {
            *guard = Some(token.into());
        }
    }

    pub fn clear_token(&self) {
        if let Ok(mut guard) = self.token.write() {
            *guard = None;
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|guard| guard.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!("{} {}", method, url);

        let builder = self.http.request(method, url);
        match self.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        Self::send(self.request(Method::GET, path)).await
    }

    pub(crate) async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        Self::send(self.request(Method::POST, path).json(body)).await
    }

    pub(crate) async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        Self::send(self.request(Method::PUT, path).json(body)).await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        Self::send(self.request(Method::DELETE, path)).await
    }

    async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let err = ApiError::from_body(status.as_u16(), &body);
            debug!("Request failed: {}", err);
            return Err(err);
        }

        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

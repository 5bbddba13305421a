//! Application state
//!
//! This module wires the API client, request cache, notifier, session and
//! every service into one shared container, the same way each front end
//! would build it at startup.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::cache::{create_cache, QueryCache};
use crate::config::Config;
use crate::services::{
    CourseService, ImageUploader, LessonService, ModuleService, Notifier, PasswordReset, Registration,
    ServiceError, SessionContext, StudentService, TokenStore,
};

/// Shared services for one signed-in (or signing-in) creator
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub api: Arc<ApiClient>,
    pub cache: Arc<QueryCache>,
    pub notifier: Arc<Notifier>,
    pub session: Arc<SessionContext>,
    pub courses: Arc<CourseService>,
    pub modules: Arc<ModuleService>,
    pub lessons: Arc<LessonService>,
    pub students: Arc<StudentService>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("base_url", &self.api.base_url())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Build every service over a fresh API client and cache
    ///
    /// The session is not restored yet; call `session.init()` before use.
    pub fn build(config: Config, store: Arc<dyn TokenStore>) -> Result<Self, ServiceError> {
        let api = Arc::new(ApiClient::new(&config.api)?);
        let cache = create_cache(&config.cache);
        let notifier = Arc::new(Notifier::new());

        let session = Arc::new(SessionContext::new(api.clone(), cache.clone(), store, notifier.clone()));
        let uploader = ImageUploader::new(api.clone(), config.storage.clone());

        Ok(Self {
            courses: Arc::new(CourseService::new(api.clone(), cache.clone(), notifier.clone(), uploader)),
            modules: Arc::new(ModuleService::new(api.clone(), cache.clone(), notifier.clone())),
            lessons: Arc::new(LessonService::new(api.clone(), cache.clone(), notifier.clone())),
            students: Arc::new(StudentService::new(api.clone(), cache.clone(), notifier.clone())),
            config: Arc::new(config),
            api,
            cache,
            notifier,
            session,
        })
    }

    /// Start a registration flow bound to this session
    pub fn registration(&self) -> Registration {
        Registration::new(self.api.clone(), self.session.clone(), self.notifier.clone())
    }

    /// Start a forgot-password flow
    pub fn password_reset(&self) -> PasswordReset {
        PasswordReset::new(self.api.clone(), self.notifier.clone())
    }
}

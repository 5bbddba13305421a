//! Transient notifications
//!
//! Every outcome the creator should see (a server confirmation, a failed
//! request, a rejected form) becomes a [`Notice`]. Notices are queued until
//! the front end drains and renders them, and are mirrored to `tracing`.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;
use tracing::{info, warn};

use super::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Queue of pending notices
#[derive(Debug, Default)]
pub struct Notifier {
    queue: Mutex<VecDeque<Notice>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => warn!("{}", notice.message),
            _ => info!("{}", notice.message),
        }

        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(notice);
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(Notice::new(NoticeLevel::Info, message));
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(Notice::new(NoticeLevel::Success, message));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(Notice::new(NoticeLevel::Error, message));
    }

    /// Surface a failure and hand it back for propagation
    pub fn fail(&self, err: impl Into<ServiceError>) -> ServiceError {
        let err = err.into();
        self.error(err.user_message());
        err
    }

    /// Take every queued notice, oldest first
    pub fn drain(&self) -> Vec<Notice> {
        self.queue
            .lock()
            .map(|mut queue| queue.drain(..).collect())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<Notice> {
        self.queue.lock().ok().and_then(|queue| queue.back().cloned())
    }
}

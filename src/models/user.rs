//! User model
//!
//! This module defines the creator account the session belongs to and the
//! student rows shown in the read-only roster.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The authenticated creator.
///
/// Every field except `id`, `name` and `email` is optional on the wire; the
/// session may only know what the token claims carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Display name ("first last")
    pub name: String,
    /// Email address (unique)
    pub email: String,
    #[serde(default)]
    pub mobile: String,
    /// Avatar image name
    #[serde(default)]
    pub image: String,
    /// Creator's public domain
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub bio: String,
    /// Self-described role ("Graphic designer")
    #[serde(default)]
    pub role: String,
    /// Authorization roles granted by the server
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// Check if the server granted the creator role
    pub fn is_creator(&self) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case("creator"))
    }
}

/// A student row in the roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub mobile: String,
}

/// `GET /auth/user`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentList {
    pub users: Vec<Student>,
}

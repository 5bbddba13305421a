//! Declarative form validation
//!
//! Each form lists its checks as `(field, constraint, message)` rules. A
//! form that needs checks spanning several fields adds them in
//! [`Validate::refine`]. Validation runs before any request is built, and
//! every failing rule is reported, not just the first.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use thiserror::Error;

// Patterns are literals; `None` only if one is edited into an invalid
// form, in which case the constraint fails closed.
static EMAIL_RE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-']+@[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$").ok()
});

static URL_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*://[^\s/?#]+[^\s]*$").ok());

fn matches(re: &Lazy<Option<Regex>>, value: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(value))
}

/// A single check applied to one field value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constraint {
    /// At least `n` characters
    MinLen(usize),
    /// At most `n` characters
    MaxLen(usize),
    /// Exactly `n` characters
    ExactLen(usize),
    /// A syntactically valid email address
    Email,
    /// Empty, or a valid absolute URL
    UrlOrEmpty,
    /// A number greater than or equal to zero
    NonNegative,
}

impl Constraint {
    pub fn check(&self, value: &str) -> bool {
        let len = value.chars().count();
        match *self {
            Constraint::MinLen(n) => len >= n,
            Constraint::MaxLen(n) => len <= n,
            Constraint::ExactLen(n) => len == n,
            Constraint::Email => matches(&EMAIL_RE, value),
            Constraint::UrlOrEmpty => value.is_empty() || matches(&URL_RE, value),
            Constraint::NonNegative => value
                .trim()
                .parse::<f64>()
                .map(|n| n.is_finite() && n >= 0.0)
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub field: &'static str,
    pub constraint: Constraint,
    pub message: &'static str,
}

pub const fn rule(field: &'static str, constraint: Constraint, message: &'static str) -> Rule {
    Rule {
        field,
        constraint,
        message,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Every failed rule of one form
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError::new(field, message)],
        }
    }

    /// Messages reported for `field`
    pub fn for_field(&self, field: &str) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.message.as_str())
            .collect()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
        write!(f, "Validation Errors: {}", messages.join("; "))
    }
}

/// A form checked against a static rule list
pub trait Validate {
    fn rules() -> &'static [Rule];

    /// Current value of a named field
    fn value(&self, field: &str) -> String;

    /// Cross-field checks, run after the per-field rules
    fn refine(&self, _errors: &mut Vec<FieldError>) {}

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors: Vec<FieldError> = Self::rules()
            .iter()
            .filter(|r| !r.constraint.check(&self.value(r.field)))
            .map(|r| FieldError::new(r.field, r.message))
            .collect();

        self.refine(&mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors { errors })
        }
    }
}

/// Single-field email form (OTP request, forgot password)
#[derive(Debug, Clone, Default)]
pub struct EmailForm {
    pub email: String,
}

impl Validate for EmailForm {
    fn rules() -> &'static [Rule] {
        const RULES: &[Rule] = &[rule("email", Constraint::Email, "Invalid email address")];
        RULES
    }

    fn value(&self, _field: &str) -> String {
        self.email.clone()
    }
}

#[derive(Debug, Clone, Default)]
pub struct OtpForm {
    pub otp: String,
}

impl Validate for OtpForm {
    fn rules() -> &'static [Rule] {
        const RULES: &[Rule] = &[rule(
            "otp",
            Constraint::MinLen(6),
            "Your one-time password must be 6 characters.",
        )];
        RULES
    }

    fn value(&self, _field: &str) -> String {
        self.otp.clone()
    }
}

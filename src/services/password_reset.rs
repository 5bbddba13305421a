//! Forgot-password flow
//!
//! Same OTP handshake as registration, against the forgot-password
//! endpoint: send OTP, verify it, then set a new password.

use std::sync::Arc;
use tracing::info;

use crate::api::ApiClient;

use super::notify::Notifier;
use super::validation::{rule, Constraint, EmailForm, FieldError, OtpForm, Rule, Validate};
use super::{FlowError, ServiceError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetState {
    Start,
    OtpSent { email: String },
    Verified { email: String },
    Done,
}

#[derive(Debug, Clone, Default)]
pub struct NewPasswordForm {
    pub password: String,
    pub repeat_password: String,
}

impl Validate for NewPasswordForm {
    fn rules() -> &'static [Rule] {
        const RULES: &[Rule] = &[
            rule("password", Constraint::MinLen(8), "Password must be at least 8 characters long"),
            rule("password", Constraint::MaxLen(20), "Password cannot exceed 20 characters"),
            rule("repeat_password", Constraint::MinLen(8), "Password must be at least 8 characters long"),
            rule("repeat_password", Constraint::MaxLen(20), "Password cannot exceed 20 characters"),
        ];
        RULES
    }

    fn value(&self, field: &str) -> String {
        match field {
            "password" => self.password.clone(),
            "repeat_password" => self.repeat_password.clone(),
            _ => String::new(),
        }
    }

    fn refine(&self, errors: &mut Vec<FieldError>) {
        if self.password != self.repeat_password {
            errors.push(FieldError::new("repeat_password", "Passwords do not match"));
        }
    }
}

pub struct PasswordReset {
    api: Arc<ApiClient>,
    notifier: Arc<Notifier>,
    state: ResetState,
}

impl std::fmt::Debug for PasswordReset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordReset").field("state", &self.state).finish()
    }
}

impl PasswordReset {
    pub fn new(api: Arc<ApiClient>, notifier: Arc<Notifier>) -> Self {
        Self {
            api,
            notifier,
            state: ResetState::Start,
        }
    }

    pub fn state(&self) -> &ResetState {
        &self.state
    }

    /// Send (or resend) the reset OTP
    pub async fn send_otp(&mut self, email: &str) -> Result<(), ServiceError> {
        EmailForm { email: email.to_string() }
            .validate()
            .map_err(|e| self.notifier.fail(e))?;

        let response = self
            .api
            .send_forgot_password_email(email)
            .await
            .map_err(|e| self.notifier.fail(e))?;

        self.state = ResetState::OtpSent { email: response.email };
        self.notifier.success(response.message);
        Ok(())
    }

    pub async fn verify_otp(&mut self, otp: &str) -> Result<(), ServiceError> {
        let ResetState::OtpSent { email } = &self.state else {
            return Err(self.notifier.fail(FlowError::OtpNotRequested));
        };
        let email = email.clone();

        OtpForm { otp: otp.to_string() }
            .validate()
            .map_err(|e| self.notifier.fail(e))?;

        let response = self
            .api
            .verify_email_otp(&email, otp)
            .await
            .map_err(|e| self.notifier.fail(e))?;

        self.state = ResetState::Verified { email: response.email };
        self.notifier.success(response.message);
        Ok(())
    }

    pub async fn reset(&mut self, form: &NewPasswordForm) -> Result<(), ServiceError> {
        let ResetState::Verified { email } = &self.state else {
            return Err(self.notifier.fail(FlowError::EmailNotVerified));
        };
        let email = email.clone();

        form.validate().map_err(|e| self.notifier.fail(e))?;

        let response = self
            .api
            .reset_password(&email, &form.password)
            .await
            .map_err(|e| self.notifier.fail(e))?;

        self.state = ResetState::Done;
        self.notifier.success(response.message);
        info!("Password reset for {}", response.email);
        Ok(())
    }
}

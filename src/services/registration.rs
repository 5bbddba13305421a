//! Creator registration
//!
//! Registration is a two-step form gated on email verification:
//!
//! ```text
//! Unverified --request_otp--> OtpSent --verify_otp--> Verified --submit--> AccountCreated
//!                              ^    |
//!                              +----+ resend
//! ```
//!
//! Neither step can advance while the email is unverified, and nothing is
//! sent to the server in that case.

use std::sync::Arc;
use tracing::info;

use crate::api::ApiClient;
use crate::models::RegisterRequest;

use super::mutation::Mutation;
use super::notify::Notifier;
use super::session::SessionContext;
use super::validation::{rule, Constraint, EmailForm, OtpForm, Rule, Validate};
use super::{FlowError, ServiceError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationState {
    Unverified,
    OtpSent { email: String },
    Verified { email: String },
    AccountCreated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStep {
    Account,
    Profile,
}

/// Step one: account details
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile: String,
    pub password: String,
}

impl Validate for AccountDetails {
    fn rules() -> &'static [Rule] {
        const RULES: &[Rule] = &[
            rule("first_name", Constraint::MinLen(2), "First name require minimum 2 characters"),
            rule("first_name", Constraint::MaxLen(70), "First Name cannot exceed 70 characters"),
            rule("last_name", Constraint::MinLen(2), "Last name require minimum 2 characters"),
            rule("last_name", Constraint::MaxLen(70), "Last Name cannot exceed 70 characters"),
            rule("email", Constraint::Email, "Invalid email address"),
            rule("email", Constraint::MaxLen(255), "Email cannot exceed 255 characters"),
            rule("mobile", Constraint::ExactLen(10), "Mobile number must be 10 digits"),
            rule("password", Constraint::MinLen(8), "Password must be at least 8 characters long"),
            rule("password", Constraint::MaxLen(20), "Password cannot exceed 20 characters"),
        ];
        RULES
    }

    fn value(&self, field: &str) -> String {
        match field {
            "first_name" => self.first_name.clone(),
            "last_name" => self.last_name.clone(),
            "email" => self.email.clone(),
            "mobile" => self.mobile.clone(),
            "password" => self.password.clone(),
            _ => String::new(),
        }
    }
}

/// Step two: public creator profile
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileDetails {
    pub domain: String,
    pub bio: String,
    pub role: String,
}

impl Validate for ProfileDetails {
    fn rules() -> &'static [Rule] {
        const RULES: &[Rule] = &[
            rule("domain", Constraint::MinLen(4), "Domain name require minimum 4 characters"),
            rule("domain", Constraint::MaxLen(255), "Domain cannot exceed 255 characters"),
            rule("bio", Constraint::MinLen(20), "bio require minimum 20 characters"),
            rule("role", Constraint::MinLen(4), "Role require minimum 4 characters"),
            rule("role", Constraint::MaxLen(70), "Role cannot exceed 70 characters"),
        ];
        RULES
    }

    fn value(&self, field: &str) -> String {
        match field {
            "domain" => self.domain.clone(),
            "bio" => self.bio.clone(),
            "role" => self.role.clone(),
            _ => String::new(),
        }
    }
}

/// Registration flow for one prospective creator
pub struct Registration {
    api: Arc<ApiClient>,
    session: Arc<SessionContext>,
    notifier: Arc<Notifier>,
    state: RegistrationState,
    step: RegistrationStep,
    account: Option<AccountDetails>,
    submit: Mutation,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("state", &self.state)
            .field("step", &self.step)
            .finish()
    }
}

impl Registration {
    pub fn new(api: Arc<ApiClient>, session: Arc<SessionContext>, notifier: Arc<Notifier>) -> Self {
        Self {
            api,
            session,
            notifier,
            state: RegistrationState::Unverified,
            step: RegistrationStep::Account,
            account: None,
            submit: Mutation::new(),
        }
    }

    pub fn state(&self) -> &RegistrationState {
        &self.state
    }

    pub fn step(&self) -> RegistrationStep {
        self.step
    }

    /// Step-one data kept while the creator is on step two
    pub fn account(&self) -> Option<&AccountDetails> {
        self.account.as_ref()
    }

    fn verified_email(&self) -> Option<&str> {
        match &self.state {
            RegistrationState::Verified { email } => Some(email),
            _ => None,
        }
    }

    /// Send (or resend) the verification OTP
    pub async fn request_otp(&mut self, email: &str) -> Result<(), ServiceError> {
        if self.state == RegistrationState::AccountCreated {
            return Ok(());
        }

        EmailForm { email: email.to_string() }
            .validate()
            .map_err(|e| self.notifier.fail(e))?;

        let response = self
            .api
            .send_verify_email(email)
            .await
            .map_err(|e| self.notifier.fail(e))?;

        self.state = RegistrationState::OtpSent { email: response.email };
        self.notifier.success(response.message);
        Ok(())
    }

    pub async fn verify_otp(&mut self, otp: &str) -> Result<(), ServiceError> {
        let RegistrationState::OtpSent { email } = &self.state else {
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

        self.state = RegistrationState::Verified { email: response.email };
        self.notifier.success(response.message);
        Ok(())
    }

    /// Advance from account details to the profile step
    pub fn next_step(&mut self, account: AccountDetails) -> Result<(), ServiceError> {
        let Some(verified) = self.verified_email() else {
            return Err(self.notifier.fail(FlowError::EmailNotVerified));
        };

        if !verified.eq_ignore_ascii_case(account.email.trim()) {
            return Err(self.notifier.fail(FlowError::EmailMismatch));
        }

        account.validate().map_err(|e| self.notifier.fail(e))?;

        self.account = Some(account);
        self.step = RegistrationStep::Profile;
        Ok(())
    }

    /// Back to step one, keeping what was entered
    pub fn previous_step(&mut self) {
        self.step = RegistrationStep::Account;
    }

    /// Create the account and start the session
    pub async fn submit(&mut self, profile: ProfileDetails) -> Result<(), ServiceError> {
        if self.verified_email().is_none() {
            return Err(self.notifier.fail(FlowError::EmailNotVerified));
        }

        let Some(account) = self.account.clone() else {
            return Err(self.notifier.fail(FlowError::StepOneIncomplete));
        };

        profile.validate().map_err(|e| self.notifier.fail(e))?;
        let _pending = self.submit.begin()?;

        let request = RegisterRequest {
            name: format!("{} {}", account.first_name.trim(), account.last_name.trim()),
            email: account.email,
            password: account.password,
            mobile: account.mobile,
            domain: profile.domain,
            bio: profile.bio,
            role: profile.role,
        };

        let response = self
            .api
            .register(&request)
            .await
            .map_err(|e| self.notifier.fail(e))?;

        self.session.login(&response.token).await?;
        self.state = RegistrationState::AccountCreated;
        self.account = None;
        self.notifier.success(response.message);

        info!("Registered creator {}", request.email);
        Ok(())
    }
}

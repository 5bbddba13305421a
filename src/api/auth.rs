//! Creator authentication endpoints

use super::{endpoints, ApiClient, ApiError};
use crate::models::{
    AuthResponse, LoginRequest, RegisterRequest, ResetPasswordRequest, ResetPasswordResponse,
    SendOtpRequest, SendOtpResponse, VerifyOtpRequest, VerifyOtpResponse,
};

impl ApiClient {
    /// Send a verification OTP to an address that is about to register
    pub async fn send_verify_email(&self, email: &str) -> Result<SendOtpResponse, ApiError> {
        let body = SendOtpRequest {
            email: email.to_string(),
        };
        self.post(endpoints::SEND_VERIFY_EMAIL, &body).await
    }

    /// Verify an OTP for either registration or password reset
    pub async fn verify_email_otp(&self, email: &str, otp: &str) -> Result<VerifyOtpResponse, ApiError> {
        let body = VerifyOtpRequest {
            email: email.to_string(),
            otp: otp.to_string(),
        };
        self.post(endpoints::VERIFY_EMAIL_OTP, &body).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.post(endpoints::REGISTER, request).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.post(endpoints::LOGIN, &body).await
    }

    /// Send a password-reset OTP to an existing creator
    pub async fn send_forgot_password_email(&self, email: &str) -> Result<SendOtpResponse, ApiError> {
        let body = SendOtpRequest {
            email: email.to_string(),
        };
        self.post(endpoints::FORGOT_PASSWORD_SEND_EMAIL, &body).await
    }

    pub async fn reset_password(&self, email: &str, password: &str) -> Result<ResetPasswordResponse, ApiError> {
        let body = ResetPasswordRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.post(endpoints::RESET_PASSWORD, &body).await
    }
}

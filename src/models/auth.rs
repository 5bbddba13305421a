//! Authentication payloads
//!
//! Request and response bodies of the creator auth endpoints.

use serde::{Deserialize, Serialize};

/// Request body for sending a verification OTP
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOtpRequest {
    pub email: String,
}

/// Response to an OTP email request; echoes the address the OTP went to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOtpResponse {
    pub message: String,
    pub email: String,
}

/// Request body for verifying an OTP
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOtpResponse {
    pub message: String,
    pub email: String,
}

/// Request body for creator registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub mobile: String,
    pub domain: String,
    pub bio: String,
    pub role: String,
}

/// Request body for creator login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response for successful authentication (login and register)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
}

/// Request body for resetting a password after OTP verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetPasswordResponse {
    pub message: String,
    pub email: String,
}

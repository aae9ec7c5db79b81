//! Request validation run before any side effect

use regex::Regex;

use super::error::ApiError;
use super::models::{normalize_email, RegisterRequest};
use super::password::validate_password;

/// Registration input once every rule has passed
#[derive(Debug)]
pub struct NewAccount {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

/// Basic email format check on already-normalized input.
pub fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

fn valid_full_name(name: &str) -> bool {
    Regex::new(r"^[A-Za-z\s]+$").is_ok_and(|regex| regex.is_match(name))
}

/// Check a registration payload, reporting every problem at once
pub fn validate_registration(req: RegisterRequest) -> Result<NewAccount, ApiError> {
    let mut errors: Vec<String> = Vec::new();

    let full_name = req.full_name.as_deref().map(str::trim).unwrap_or_default();
    if req.full_name.is_none() {
        errors.push("Fullname is required".to_string());
    } else if full_name.is_empty() {
        errors.push("Fullname cannot be empty".to_string());
    } else {
        if full_name.chars().count() < 3 {
            errors.push("Fullname should not be less than 3 letters".to_string());
        }
        if !valid_full_name(full_name) {
            errors.push("Fullname should only contain alphabets".to_string());
        }
    }

    let email = req.email.as_deref().map(normalize_email).unwrap_or_default();
    if req.email.is_none() {
        errors.push("Email is required".to_string());
    } else if !valid_email(&email) {
        errors.push("Invalid email format".to_string());
    }

    let password = req.password.unwrap_or_default();
    if password.is_empty() {
        errors.push("Password is required".to_string());
    } else {
        errors.extend(validate_password(&password).into_iter().map(String::from));
    }

    if let Some(confirm) = &req.confirm_password {
        if *confirm != password {
            errors.push("Passwords do not match".to_string());
        }
    }

    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    Ok(NewAccount {
        full_name: full_name.to_string(),
        email,
        password,
    })
}

/// Pull a required email out of an optional field
pub fn require_email(email: Option<&str>, message: &str) -> Result<String, ApiError> {
    match email.map(normalize_email) {
        Some(email) if !email.is_empty() => Ok(email),
        _ => Err(ApiError::Validation(vec![message.to_string()])),
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login, signup and password reset payloads.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email(message = "Please enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters."))]
    pub password: String,
    /// Keep the session cookie across browser restarts
    #[serde(default)]
    pub remember_me: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "passwords_match", skip_on_field_errors = false))]
pub struct SignupRequest {
    #[validate(length(min = 2, message = "Name must be at least 2 characters."))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email address."))]
    pub email: String,
    #[validate(
        length(min = 8, message = "Password must be at least 8 characters."),
        custom(function = "validate_password_rules")
    )]
    pub password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters."))]
    pub confirm_password: String,
    #[validate(custom(function = "must_accept_terms"))]
    #[serde(default)]
    pub terms: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PasswordResetRequest {
    #[validate(email(message = "Please enter a valid email address."))]
    pub email: String,
}

fn rule_error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

fn validate_password_rules(password: &str) -> Result<(), ValidationError> {
    let checks = PasswordChecks::of(password);
    if !checks.uppercase {
        return Err(rule_error(
            "password_uppercase",
            "Password must contain at least one uppercase letter.",
        ));
    }
    if !checks.lowercase {
        return Err(rule_error(
            "password_lowercase",
            "Password must contain at least one lowercase letter.",
        ));
    }
    if !checks.digit {
        return Err(rule_error(
            "password_number",
            "Password must contain at least one number.",
        ));
    }
    if !checks.special {
        return Err(rule_error(
            "password_special",
            "Password must contain at least one special character.",
        ));
    }
    Ok(())
}

fn must_accept_terms(terms: &bool) -> Result<(), ValidationError> {
    if *terms {
        Ok(())
    } else {
        Err(rule_error(
            "terms",
            "You must agree to the terms and conditions.",
        ))
    }
}

fn passwords_match(request: &SignupRequest) -> Result<(), ValidationError> {
    if request.password == request.confirm_password {
        Ok(())
    } else {
        Err(rule_error("password_mismatch", "Passwords do not match"))
    }
}

struct PasswordChecks {
    long_enough: bool,
    uppercase: bool,
    lowercase: bool,
    digit: bool,
    special: bool,
}

impl PasswordChecks {
    fn of(password: &str) -> Self {
        Self {
            long_enough: password.chars().count() >= MIN_PASSWORD_LEN,
            uppercase: password.chars().any(|c| c.is_ascii_uppercase()),
            lowercase: password.chars().any(|c| c.is_ascii_lowercase()),
            digit: password.chars().any(|c| c.is_ascii_digit()),
            special: password.chars().any(|c| !c.is_ascii_alphanumeric()),
        }
    }

    fn score(&self) -> u8 {
        [
            self.long_enough,
            self.uppercase,
            self.lowercase,
            self.digit,
            self.special,
        ]
        .into_iter()
        .filter(|passed| *passed)
        .count() as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum StrengthLevel {
    Weak,
    Moderate,
    Strong,
}

/// Password strength meter shown while the user types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PasswordStrength {
    /// Number of satisfied rules, 0..=5
    pub score: u8,
    pub level: StrengthLevel,
}

pub fn password_strength(password: &str) -> PasswordStrength {
    let score = PasswordChecks::of(password).score();
    let level = match score {
        0..=2 => StrengthLevel::Weak,
        3..=4 => StrengthLevel::Moderate,
        _ => StrengthLevel::Strong,
    };
    PasswordStrength { score, level }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(password: &str, confirm: &str, terms: bool) -> SignupRequest {
        SignupRequest {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.org".to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
            terms,
        }
    }

    #[test]
    fn test_login_validation() {
        let ok = LoginRequest {
            email: "ada@example.org".to_string(),
            password: "longenough".to_string(),
            remember_me: false,
        };
        assert!(ok.validate().is_ok());

        let bad = LoginRequest {
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            remember_me: false,
        };
        let errors = bad.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn test_signup_valid() {
        assert!(signup("Str0ng!pass", "Str0ng!pass", true).validate().is_ok());
    }

    #[test]
    fn test_signup_password_rules() {
        let errors = signup("alllowercase1!", "alllowercase1!", true)
            .validate()
            .unwrap_err();
        let password_errors = errors.field_errors()["password"];
        assert_eq!(password_errors[0].code, "password_uppercase");
    }

    #[test]
    fn test_signup_mismatch_and_terms() {
        let errors = signup("Str0ng!pass", "Str0ng!pasz", false)
            .validate()
            .unwrap_err();
        assert!(errors.field_errors().contains_key("terms"));
        assert!(errors.errors().contains_key("__all__"));
    }

    #[test]
    fn test_password_strength_levels() {
        assert_eq!(password_strength("").score, 0);
        assert_eq!(password_strength("abc").level, StrengthLevel::Weak);
        assert_eq!(password_strength("abcdefgh1").level, StrengthLevel::Moderate);
        assert_eq!(password_strength("Abcdefg1!"), PasswordStrength {
            score: 5,
            level: StrengthLevel::Strong
        });
    }
}

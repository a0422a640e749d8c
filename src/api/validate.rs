use regex::Regex;
use std::sync::OnceLock;

use super::error::FieldErrors;

pub const USER_NAME_LENGTH: usize = 150;
pub const EMAIL_LENGTH: usize = 254;
pub const RECIPE_NAME_LENGTH: usize = 256;
pub const TAG_LENGTH: usize = 32;
pub const INGREDIENT_NAME_LENGTH: usize = 128;
pub const MEASUREMENT_UNIT_LENGTH: usize = 64;
pub const MIN_PASSWORD_LENGTH: usize = 8;
/// Upper bound of amounts and cooking times.
pub const MAX_SMALL_INT: i64 = 32767;

pub const REQUIRED: &str = "This field is required.";

static USERNAME: OnceLock<Regex> = OnceLock::new();
static EMAIL: OnceLock<Regex> = OnceLock::new();
static SLUG: OnceLock<Regex> = OnceLock::new();

pub fn is_valid_username(username: &str) -> bool {
    USERNAME
        .get_or_init(|| Regex::new(r"^[\w.@+-]+$").unwrap())
        .is_match(username)
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap())
        .is_match(email)
}

pub fn is_valid_slug(slug: &str) -> bool {
    SLUG.get_or_init(|| Regex::new(r"^[-a-zA-Z0-9_]+$").unwrap())
        .is_match(slug)
}

/// `me` names the current user in `/api/users/me/`.
pub fn is_reserved_username(username: &str) -> bool {
    username == "me"
}

/// Checks a required text field and returns its trimmed value.
pub fn required_text<'a>(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&'a str>,
    max_len: Option<usize>,
) -> Option<&'a str> {
    let value = match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        Some(_) => {
            errors.add(field, "This field may not be blank.");
            return None;
        }
        None => {
            errors.add(field, REQUIRED);
            return None;
        }
    };
    if let Some(max) = max_len {
        if value.chars().count() > max {
            errors.add(
                field,
                format!("Ensure this field has no more than {} characters.", max),
            );
            return None;
        }
    }
    Some(value)
}

/// Checks an integer against `1..=MAX_SMALL_INT`.
pub fn check_positive(errors: &mut FieldErrors, field: &str, value: i64) -> bool {
    if value < 1 {
        errors.add(field, "Ensure this value is greater than or equal to 1.");
        false
    } else if value > MAX_SMALL_INT {
        errors.add(
            field,
            format!("Ensure this value is less than or equal to {}.", MAX_SMALL_INT),
        );
        false
    } else {
        true
    }
}

pub fn check_password(errors: &mut FieldErrors, field: &str, password: &str) {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.add(
            field,
            format!(
                "This password is too short. It must contain at least {} characters.",
                MIN_PASSWORD_LENGTH
            ),
        );
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        errors.add(field, "This password is entirely numeric.");
    }
}

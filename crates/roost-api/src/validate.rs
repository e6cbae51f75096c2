use lettre::Address;

use crate::error::ApiError;

pub fn username(value: &str) -> Result<(), ApiError> {
    let len = value.chars().count();
    if !(3..=32).contains(&len) {
        return Err(ApiError::Validation(
            "username must be between 3 and 32 characters".into(),
        ));
    }
    Ok(())
}

pub fn password(value: &str) -> Result<(), ApiError> {
    if value.chars().count() < 8 {
        return Err(ApiError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }
    Ok(())
}

pub fn email(value: &str) -> Result<(), ApiError> {
    value
        .trim()
        .parse::<Address>()
        .map(|_| ())
        .map_err(|_| ApiError::Validation("email must be a valid email address".into()))
}

/// Non-blank text no longer than `max` characters.
pub fn text(field: &str, value: &str, max: usize) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{} must not be empty", field)));
    }
    if value.chars().count() > max {
        return Err(ApiError::Validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

pub fn non_negative<T>(field: &str, value: Option<T>) -> Result<(), ApiError>
where
    T: PartialOrd + Default,
{
    match value {
        Some(v) if v < T::default() => Err(ApiError::Validation(format!(
            "{} must not be negative",
            field
        ))),
        _ => Ok(()),
    }
}

pub fn price(value: f64) -> Result<(), ApiError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ApiError::Validation("price must be a non-negative number".into()));
    }
    Ok(())
}

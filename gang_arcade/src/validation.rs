//! Input validation shared by the managers.
//!
//! These rules gate every value that ends up in a SQL statement or in an
//! outgoing email, so handlers never need to re-check them.

use chrono::NaiveDate;
use lettre::Address;
use std::str::FromStr;

/// Maximum username length
pub const MAX_USERNAME_LEN: usize = 32;

/// Minimum password length
pub const MIN_PASSWORD_LEN: usize = 6;

/// ASCII letters and digits only, 1 to [`MAX_USERNAME_LEN`] characters.
pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username.len() <= MAX_USERNAME_LEN
        && username.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Syntactically valid `local@domain` address.
pub fn is_valid_email(email: &str) -> bool {
    Address::from_str(email)
        .map(|address| address.domain().contains('.'))
        .unwrap_or(false)
}

/// Letters (any script) and inner spaces, at least one letter.
pub fn is_valid_name(name: &str) -> bool {
    name.chars().any(|c| c.is_alphabetic()) && name.chars().all(|c| c.is_alphabetic() || c == ' ')
}

/// Calendar date in `YYYY-MM-DD` form.
pub fn is_valid_date(date: &str) -> bool {
    date.len() == 10 && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
}

/// Password length check; strength beyond length is left to the user.
pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

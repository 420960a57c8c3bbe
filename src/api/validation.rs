//! Field validation for request bodies and query parameters.
//!
//! Rules are checked in order per field and only the first failure of a
//! field is reported.

use regex::Regex;
use std::sync::OnceLock;

use super::types::{CreateUserRequest, PageQuery, UpdateUserRequest};
use crate::constants::limits::{
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PASSWORD_MAX, PASSWORD_MIN, USERNAME_MAX, USERNAME_MIN,
};
use crate::domain::{FieldErrors, PageRequest, PlaintextPassword, UserId};
use crate::i18n::Message;
use crate::services::Registration;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Invalid regex"))
}

fn check_username(username: Option<&str>, errors: &mut FieldErrors) {
    let username = username.unwrap_or_default();
    if username.trim().is_empty() {
        errors.add("username", Message::UsernameBlank);
    }
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        errors.add("username", Message::UsernameSize);
    }
}

fn check_email(email: Option<&str>, errors: &mut FieldErrors) {
    let email = email.unwrap_or_default();
    if email.trim().is_empty() {
        errors.add("email", Message::EmailBlank);
    }
    if !email_regex().is_match(email) {
        errors.add("email", Message::EmailInvalid);
    }
}

fn check_password(password: Option<&PlaintextPassword>, errors: &mut FieldErrors) {
    let password = password.map(PlaintextPassword::expose).unwrap_or_default();
    if password.trim().is_empty() {
        errors.add("password", Message::PasswordBlank);
    }
    let len = password.chars().count();
    if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&len) {
        errors.add("password", Message::PasswordSize);
    }
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_lower && has_upper && has_digit) {
        errors.add("password", Message::PasswordPattern);
    }
}

pub fn validate_create_user(request: CreateUserRequest) -> Result<Registration, FieldErrors> {
    let mut errors = FieldErrors::new();
    check_username(request.username.as_deref(), &mut errors);
    check_email(request.email.as_deref(), &mut errors);
    check_password(request.password.as_ref(), &mut errors);

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(Registration {
        username: request.username.unwrap_or_default(),
        email: request.email.unwrap_or_default(),
        password: request.password.unwrap_or_default(),
    })
}

pub fn validate_update_user(request: UpdateUserRequest) -> Result<String, FieldErrors> {
    let mut errors = FieldErrors::new();
    check_username(request.username.as_deref(), &mut errors);

    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(request.username.unwrap_or_default())
}

pub fn validate_email(email: Option<String>) -> Result<String, FieldErrors> {
    let mut errors = FieldErrors::new();
    check_email(email.as_deref(), &mut errors);

    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(email.unwrap_or_default())
}

pub fn validate_page(query: &PageQuery) -> Result<PageRequest, FieldErrors> {
    let size = query.size.unwrap_or(DEFAULT_PAGE_SIZE);
    if !(1..=MAX_PAGE_SIZE).contains(&size) {
        return Err(FieldErrors::single("size", Message::PageSizeOutOfRange));
    }

    // The store computes `page * size` as an SQL offset.
    let page = query.page.unwrap_or(0);
    let offset_fits = page
        .checked_mul(size)
        .is_some_and(|offset| i64::try_from(offset).is_ok());
    if !offset_fits {
        return Err(FieldErrors::single("page", Message::PageOutOfRange));
    }

    Ok(PageRequest { page, size })
}

pub fn parse_user_id(raw: &str) -> Result<UserId, FieldErrors> {
    raw.parse::<i32>()
        .map(UserId::new)
        .map_err(|_| FieldErrors::single("id", Message::IdNotNumeric))
}

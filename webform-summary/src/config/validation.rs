//! Address checks shared by the settings and handler validation

use std::borrow::Cow;

use lettre::Address;
use validator::{ValidateEmail, ValidationError};

/// Whether `address` is a syntactically valid email address
#[must_use]
pub fn is_valid_email(address: &str) -> bool {
    address.validate_email()
}

/// Whether `address` can be used as an SMTP envelope sender
#[must_use]
pub fn is_valid_return_path(address: &str) -> bool {
    address.parse::<Address>().is_ok()
}

pub(crate) fn required(label: &str) -> ValidationError {
    with_message("required", format!("{label} field is required."))
}

pub(crate) fn invalid_email(address: &str) -> ValidationError {
    with_message("email", format!("The email address {address} is not valid."))
}

pub(crate) fn invalid_return_path(address: &str) -> ValidationError {
    with_message(
        "return_path",
        format!("The email address {address} cannot be used as a return path."),
    )
}

fn with_message(code: &'static str, message: String) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Owned(message));
    error
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_syntax() {
        assert!(is_valid_email("sender@example.com"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("sender"));
        assert!(!is_valid_email("sender@"));
    }

    #[test]
    fn test_return_path() {
        assert!(is_valid_return_path("bounce@example.com"));
        assert!(!is_valid_return_path("Bounce <bounce@example.com>"));
        assert!(!is_valid_return_path("no at sign"));
    }

    #[test]
    fn test_messages_name_the_address() {
        let error = invalid_email("nope");
        assert_eq!(error.code, "email");
        assert!(error.message.unwrap().contains("nope"));
    }
}

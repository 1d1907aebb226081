//! Input checks run before anything is sent to the backend.

use std::borrow::Cow;

use validator::{ValidationError, ValidationErrors};

/// Characters that satisfy the "special character" password rule.
pub const PASSWORD_SPECIALS: &str = "!@#$%^&*";

pub const PASSWORD_RULE: &str =
    "Password must be 8+ chars with letters, numbers, and special characters";

pub const EMAIL_RULE: &str = "Invalid email format";

/// Password must mix a letter, a digit and one of [`PASSWORD_SPECIALS`].
pub fn password_strength(password: &str) -> Result<(), ValidationError> {
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| PASSWORD_SPECIALS.contains(c));

    if has_letter && has_digit && has_special {
        Ok(())
    } else {
        let mut err = ValidationError::new("password_strength");
        err.message = Some(Cow::Borrowed(PASSWORD_RULE));
        Err(err)
    }
}

/// `local@domain.tld`: one `@`, no whitespace, and a dot with text on both
/// sides somewhere in the domain.
pub fn email_domain(email: &str) -> Result<(), ValidationError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
                && domain
                    .char_indices()
                    .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("email_domain");
        err.message = Some(Cow::Borrowed(EMAIL_RULE));
        Err(err)
    }
}

/// Human-readable message for the first failing field, in field-name order.
pub fn first_message(errors: &ValidationErrors) -> String {
    first_message_in(errors, &[])
}

/// Like [`first_message`], but fields named in `order` are reported first,
/// in that order.
pub fn first_message_in(errors: &ValidationErrors, order: &[&str]) -> String {
    let rank = |field: &str| order.iter().position(|f| *f == field).unwrap_or(order.len());
    let mut fields: Vec<(usize, String, String)> = errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errs)| {
            errs.first().map(|e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid {}", field));
                (rank(&*field), field.to_string(), message)
            })
        })
        .collect();
    fields.sort();
    fields
        .into_iter()
        .next()
        .map(|(_, _, message)| message)
        .unwrap_or_else(|| "Invalid input".to_string())
}

/// Reject blank required text.
pub fn require(value: &str, message: &str) -> crate::Result<()> {
    if value.trim().is_empty() {
        return Err(crate::Error::Validation(message.to_string()));
    }
    Ok(())
}

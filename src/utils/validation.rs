use crate::error::{AppError, AppResult};
use validator::ValidateEmail;

pub const MSG_FILL_ALL_FIELDS: &str = "Please fill in all the fields.";
pub const MSG_INVALID_EMAIL: &str = "The entered email is invalid.";
pub const MSG_EMAIL_TAKEN: &str = "An account with this email already exists.";
pub const MSG_PASSWORD_MISMATCH: &str = "Password and confirmation don’t match.";

/// Fails with the generic "fill in all the fields" error if any value is
/// missing or blank.
pub fn require_fields(fields: &[Option<&str>]) -> AppResult<()> {
    let all_present = fields
        .iter()
        .all(|f| f.map(|v| !v.trim().is_empty()).unwrap_or(false));
    if all_present {
        Ok(())
    } else {
        Err(AppError::validation(MSG_FILL_ALL_FIELDS))
    }
}

pub fn require_valid_email(email: &str) -> AppResult<()> {
    if email.validate_email() {
        Ok(())
    } else {
        Err(AppError::validation(MSG_INVALID_EMAIL))
    }
}

/// Display name derived from an email at registration: its local part.
pub fn default_first_name(email: &str) -> String {
    email.split('@').next().unwrap_or_default().to_string()
}

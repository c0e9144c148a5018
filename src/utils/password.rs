use anyhow::{Context, Result};

/// Hash a password using bcrypt
pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).context("Failed to hash password")
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(password, hash).context("Failed to verify password")
}

/// Password and confirmation must be byte-for-byte identical.
pub fn passwords_match(password: &str, confirm_password: &str) -> bool {
    password.as_bytes() == confirm_password.as_bytes()
}

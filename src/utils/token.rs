use anyhow::{Context, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use sha2::{Digest, Sha256};

/// Bytes of OS randomness behind every session and reset token (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// Generate an opaque URL-safe token.
pub fn generate_token() -> Result<String> {
    let mut buf = [0u8; TOKEN_BYTES];
    getrandom::getrandom(&mut buf).context("OS random number generator unavailable")?;
    Ok(URL_SAFE_NO_PAD.encode(buf))
}

/// Digest stored in place of a token; lookups hash the presented value.
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

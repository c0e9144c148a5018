pub mod cookie;
pub mod flash;
pub mod markdown;
pub mod password;
pub mod token;
pub mod validation;

pub use markdown::render_markdown;
pub use password::{hash_password, passwords_match, verify_password};
pub use token::{generate_token, hash_token};

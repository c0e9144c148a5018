pub mod auth;
pub mod comment;
pub mod email;
pub mod listing;
pub mod session;
pub mod topic;
pub mod upload;
pub mod user;

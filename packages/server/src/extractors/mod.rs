pub mod auth;
pub mod bulk;
pub mod context;
pub mod json;

//! 中间件 / extractor

pub mod auth;

pub use auth::RequireApiKey;

pub mod arguments;
pub mod cache;
pub mod configs;
pub mod dispatcher;
pub mod engine;
pub mod errors;
pub mod logger;
pub mod patterns;
pub mod persistence;
pub mod pipeline;
pub mod relay;
#[cfg(feature = "telegram")]
pub mod telegram;
pub mod utils;

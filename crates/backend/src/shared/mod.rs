pub mod api_error;
pub mod cache;
pub mod config;
pub mod data;
pub mod export;

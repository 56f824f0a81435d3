pub mod build_env;
pub mod error;
pub mod models;

mod error;
mod fetch_data;
mod health;
mod health_db;
mod query_data;

pub use fetch_data::fetch_data;
pub use health::health_api;
pub use health_db::health_db;
pub use query_data::query_data;

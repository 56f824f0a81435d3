pub mod error;
pub mod models;
pub mod pipeline;
pub mod pool;
pub mod resolver;
pub mod transformer;
pub mod writer;

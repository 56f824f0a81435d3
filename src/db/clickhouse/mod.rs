pub mod clickhouse_service;
pub mod connection;
pub mod error;
pub mod models;
pub mod repository;

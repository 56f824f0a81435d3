pub mod price_repository;

pub mod ingestion;
pub mod quotes;

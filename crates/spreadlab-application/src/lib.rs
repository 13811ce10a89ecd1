pub mod analytics;
pub mod catalog;
pub mod config;
pub mod export;
pub mod ingestion;
pub mod meta;

pub mod cli;
pub mod database;
pub mod database_factory;
pub mod date_provider;
pub mod error;
pub mod report;
pub mod review_service;
pub mod row_factories;
pub mod spaced_repetition;
pub mod store;
pub mod time_format;

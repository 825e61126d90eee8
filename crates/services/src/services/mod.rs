pub mod completers;
pub mod completion_source;
pub mod config;
pub mod database_validator;
pub mod rest_store;

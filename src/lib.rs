pub mod config;
pub mod error;
pub mod fetch;
pub mod parse;
pub mod query;
pub mod server;
pub mod store;

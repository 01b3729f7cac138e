pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod query;
pub mod types;

pub mod attributes;
pub mod backend;
pub mod config;
pub mod diff;
pub mod discovery;
pub mod models;
pub mod mqtt;
pub mod parser;
pub mod scheduler;
pub mod testing;

pub mod clock;
pub mod config;
pub mod db;
pub mod provider;
pub mod scheduler;
pub mod store;

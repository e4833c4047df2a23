pub mod aggregate;
pub mod autocomplete;
pub mod db;
pub mod models;
pub mod service;
pub mod store;

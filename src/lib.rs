pub mod admin_view;
pub mod analytics;
pub mod auth;
pub mod calendar;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod store;

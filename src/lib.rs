pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod htmx;
pub mod meals;
pub mod state;
pub mod views;

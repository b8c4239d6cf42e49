pub mod api;
pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod models;
pub mod notify;
pub mod observability;
pub mod services;
pub mod state;
pub mod view;

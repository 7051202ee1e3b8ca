pub mod api;
pub mod config;
pub mod core;
pub mod metrics;
pub mod proxy;
pub mod state;
pub mod web;

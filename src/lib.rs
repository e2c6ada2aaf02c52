pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod desk;
pub mod docs;
pub mod model;
pub mod models;
pub mod routes;
pub mod session;
pub mod state;
pub mod utils;
pub mod workflow;

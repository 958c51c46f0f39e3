pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod gateways;
pub mod jobs;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;
pub mod state;
pub mod store;
pub mod utils;
pub mod workers;

pub use routes::create_router;
pub use workers::{JobHandler, Worker};

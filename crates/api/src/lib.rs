pub mod auth;
pub mod background;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod payments;
pub mod router;
pub mod routes;
pub mod state;

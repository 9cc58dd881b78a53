//! Command-Payload Gateway Library

// Core subsystems
pub mod auth;
pub mod config;
pub mod connector;
pub mod gateway;
pub mod http;
pub mod store;

// Cross-cutting concerns
pub mod health;
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;

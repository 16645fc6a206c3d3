//! # fiber-gateway
//! Node access for the fiber wallet engine over JSON HTTP.

pub mod config;
pub mod http;
mod wire;

pub use config::GatewayConfig;
pub use http::HttpGateway;

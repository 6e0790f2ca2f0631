//! # Wash server
//!
//! The HTTP and real-time surface of the wash platform. This crate is a thin shell around the
//! engine APIs: handlers validate input, call into [`wash_engine`], and shape responses; the
//! WebSocket gateway keeps connected customers, washers and admins current without polling.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html).
//!
//! ## Surfaces
//! * `/health`: liveness probe.
//! * `/api/...`: bearer-token-authenticated JSON API (reservations, jobs, payments, chat,
//!   notifications).
//! * `/payments/webhook`: the card gateway's callback endpoint, HMAC-verified against the raw
//!   request body before any parsing.
//! * `/ws`: the WebSocket gateway; the handshake carries the same bearer token as the HTTP API.

pub mod auth;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod gateway;
pub mod middleware;
pub mod routes;
pub mod server;

mod chat_routes;
mod job_routes;
mod payment_routes;

pub use chat_routes::*;
pub use job_routes::*;
pub use payment_routes::*;

#[cfg(test)]
mod endpoint_tests;

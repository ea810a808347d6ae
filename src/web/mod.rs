//! HTTP surface of the Lif Auth Server.
//!
//! Handlers are thin: they extract credentials, call into [`crate::auth`],
//! [`crate::moderation`] and friends, and map [`crate::LifError`] to
//! HTTP responses through [`ApiError`].

pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod router;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use router::create_router;
pub use server::WebServer;
pub use state::AppState;

//! Middleware for the Lif Auth Server.

pub mod cors;
pub mod rate_limit;

pub use cors::create_cors_layer;
pub use rate_limit::{login_rate_limit, LoginRateLimiter};

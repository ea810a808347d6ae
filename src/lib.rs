//! Lif Auth Server
//!
//! Account, session and permission authority for the Lif platform.
//! Other Lif services call it to log users in, verify session tokens and
//! check permission nodes; moderators use it to suspend accounts and work
//! through user reports.

pub mod access_control;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod mail;
pub mod moderation;
pub mod profile;
pub mod web;

pub use access_control::AccessControl;
pub use auth::{check_token, verify_credentials, PasswordScheme};
pub use config::Config;
pub use db::{Account, Database, Role};
pub use error::{LifError, Result};

//! Authentication module for the Lif Auth Server.
//!
//! This module provides password hashing, credential and session token
//! verification, permission checks, registration, profile updates,
//! account recovery and two-factor setup.

mod credentials;
mod password;
mod permission;
mod profile;
mod recovery;
mod registration;
mod token;
mod two_factor;
pub mod validation;

pub use credentials::verify_credentials;
pub use password::{
    generate_salt, validate_password, PasswordError, PasswordScheme, MAX_PASSWORD_LENGTH,
    SALT_BYTES,
};
pub use permission::{has_all, parse_nodes, require_nodes, require_role};
pub use profile::{
    bulk_emails, get_bio, get_email, get_pronouns, get_role, get_user_id, get_user_info,
    get_username, search_users, update_bio, update_email, update_password, update_personalization,
    update_pronouns, UserInfo, UserSearchResult, SEARCH_LIMIT,
};
pub use recovery::{
    generate_recovery_code, RecoveryContext, RecoveryRequest, RecoveryResponse, RecoverySession,
    RECOVERY_CODE_LENGTH, RECOVERY_CODE_TTL_MINUTES,
};
pub use registration::{create_account, email_in_use, username_in_use, RegistrationRequest};
pub use token::{check_token, generate_token, reset_token, retrieve_token, TOKEN_BYTES};
pub use two_factor::{generate_totp_secret, setup_two_factor, TOTP_ACCOUNT_DOMAIN, TOTP_ISSUER};
pub use validation::ValidationError;

//! Account model for the Lif Auth Server.
//!
//! This module defines the Account struct and Role enum.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{LifError, Result};

/// Default pronouns placeholder for new accounts.
pub const DEFAULT_PRONOUNS: &str = "Prefer not to say";

/// Account role.
///
/// Roles are mutually exclusive. `Suspended` overrides every permission
/// node the account holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Regular account.
    #[default]
    User,
    /// Moderator, allowed to suspend accounts and resolve reports.
    Moderator,
    /// Suspended account. Blocks all credential and token checks.
    Suspended,
}

impl Role {
    /// Convert role to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Moderator => "MODERATOR",
            Role::Suspended => "SUSPENDED",
        }
    }

    /// Whether this role blocks authentication.
    pub fn is_suspended(&self) -> bool {
        *self == Role::Suspended
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Role names are matched exactly as stored, so `moderator` is not a role.
impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Role::User),
            "MODERATOR" => Ok(Role::Moderator),
            "SUSPENDED" => Ok(Role::Suspended),
            _ => Err(format!("unknown role: {s}")),
        }
    }
}

/// How a batch of accounts is identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKey {
    /// Look accounts up by username.
    Username,
    /// Look accounts up by their opaque user id.
    UserId,
}

impl AccountKey {
    /// Column holding this key in the accounts table.
    pub fn column(&self) -> &'static str {
        match self {
            AccountKey::Username => "username",
            AccountKey::UserId => "user_id",
        }
    }
}

impl FromStr for AccountKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "username" => Ok(AccountKey::Username),
            "userID" => Ok(AccountKey::UserId),
            _ => Err(format!("unknown search mode: {s}")),
        }
    }
}

/// A registered Lif account.
#[derive(Debug, Clone)]
pub struct Account {
    /// Row id.
    pub id: i64,
    /// Opaque stable id used by other services.
    pub user_id: String,
    /// Login username (unique).
    pub username: String,
    /// Email address (unique).
    pub email: String,
    /// Salted password digest.
    pub password_hash: String,
    /// Per-account salt, rotated on every password change.
    pub salt: String,
    /// Single active session token.
    pub token: String,
    /// Account role.
    pub role: Role,
    /// Free-text bio.
    pub bio: Option<String>,
    /// Free-text pronouns.
    pub pronouns: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
}

impl Account {
    /// Check if the account is suspended.
    pub fn is_suspended(&self) -> bool {
        self.role.is_suspended()
    }

    /// Check if the account holds the moderator role.
    pub fn is_moderator(&self) -> bool {
        self.role == Role::Moderator
    }
}

/// Internal struct for mapping database rows to Account.
#[derive(sqlx::FromRow)]
pub(crate) struct AccountRow {
    id: i64,
    user_id: String,
    username: String,
    email: String,
    password: String,
    salt: String,
    token: String,
    role: String,
    bio: Option<String>,
    pronouns: Option<String>,
    created_at: String,
}

impl AccountRow {
    /// Fails on a stored role this build does not know, rather than
    /// treating the account as a regular user.
    pub(crate) fn into_account(self) -> Result<Account> {
        let role = self.role.parse().map_err(|_| {
            LifError::Internal(format!(
                "account {} has unknown role {:?}",
                self.user_id, self.role
            ))
        })?;

        Ok(Account {
            id: self.id,
            user_id: self.user_id,
            username: self.username,
            email: self.email,
            password_hash: self.password,
            salt: self.salt,
            token: self.token,
            role,
            bio: self.bio,
            pronouns: self.pronouns,
            created_at: self.created_at,
        })
    }
}

/// Data for creating a new account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Opaque user id.
    pub user_id: String,
    /// Login username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Salted password digest.
    pub password_hash: String,
    /// Salt used for the digest.
    pub salt: String,
    /// Initial session token.
    pub token: String,
    /// Role (defaults to User).
    pub role: Role,
    /// Pronouns (defaults to the placeholder).
    pub pronouns: String,
}

impl NewAccount {
    /// Create a new account with the required fields.
    pub fn new(
        user_id: impl Into<String>,
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        salt: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            salt: salt.into(),
            token: token.into(),
            role: Role::User,
            pronouns: DEFAULT_PRONOUNS.to_string(),
        }
    }

    /// Set the role.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Set the pronouns.
    pub fn with_pronouns(mut self, pronouns: impl Into<String>) -> Self {
        self.pronouns = pronouns.into();
        self
    }
}

//! Database schema and migrations for the Lif Auth Server.
//!
//! Migrations are applied in order when the database is opened. The
//! `schema_version` table tracks which ones have run.

/// Database migrations.
///
/// Each migration is a SQL script executed inside its own transaction.
pub const MIGRATIONS: &[&str] = &[
    // v1: Accounts table
    r#"
CREATE TABLE accounts (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL UNIQUE,
    email       TEXT NOT NULL UNIQUE,
    user_id     TEXT NOT NULL UNIQUE,           -- opaque id shared with other services
    password    TEXT NOT NULL,                  -- salted digest
    salt        TEXT NOT NULL,
    token       TEXT NOT NULL,                  -- single active session token
    role        TEXT NOT NULL DEFAULT 'USER',   -- 'USER', 'MODERATOR', 'SUSPENDED'
    bio         TEXT,
    pronouns    TEXT,
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_accounts_role ON accounts(role);
"#,
    // v2: Permission grants
    r#"
CREATE TABLE permissions (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id  TEXT NOT NULL REFERENCES accounts(user_id) ON DELETE CASCADE,
    node        TEXT NOT NULL,
    UNIQUE(account_id, node)
);

CREATE INDEX idx_permissions_account_id ON permissions(account_id);
"#,
    // v3: User reports
    r#"
CREATE TABLE reports (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user        TEXT NOT NULL,
    service     TEXT NOT NULL,
    reason      TEXT NOT NULL,
    content     TEXT NOT NULL,
    resolved    INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_reports_resolved ON reports(resolved);
"#,
    // v4: Account recovery codes
    r#"
CREATE TABLE recovery_codes (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    email       TEXT NOT NULL,
    code        TEXT NOT NULL,
    expires_at  TEXT NOT NULL,
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    used_at     TEXT
);

CREATE INDEX idx_recovery_codes_email ON recovery_codes(email);
"#,
    // v5: Wrong guesses per recovery code
    r#"
ALTER TABLE recovery_codes ADD COLUMN failed_attempts INTEGER NOT NULL DEFAULT 0;
"#,
    // v6: TOTP secret for two-factor setup
    r#"
ALTER TABLE accounts ADD COLUMN totp_secret TEXT;
"#,
];

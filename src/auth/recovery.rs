//! Account recovery.
//!
//! Recovery is a short conversation: the client names the account email,
//! receives a code by mail, proves it holds the code and then sets a new
//! password. [`RecoverySession`] holds the state of one conversation.

use chrono::{Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use super::password::PasswordScheme;
use super::profile::update_password;
use super::token::retrieve_token;
use crate::db::{AccountRepository, RecoveryCodeRepository};
use crate::mail::{messages, Mailer};
use crate::{LifError, Result};

/// Number of digits in a recovery code.
pub const RECOVERY_CODE_LENGTH: usize = 5;

/// Lifetime of a recovery code.
pub const RECOVERY_CODE_TTL_MINUTES: i64 = 15;

/// Generate a random decimal recovery code.
pub fn generate_recovery_code() -> String {
    let mut rng = rand::rng();
    (0..RECOVERY_CODE_LENGTH)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

/// A client message. Exactly one field is expected to be set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecoveryRequest {
    pub email: Option<String>,
    pub code: Option<String>,
    pub password: Option<String>,
}

/// A server reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "responseType", rename_all = "camelCase")]
pub enum RecoveryResponse {
    EmailSent { message: String },
    CodeCorrect { message: String },
    PasswordUpdated { username: String, token: String },
    Error { message: String },
}

impl RecoveryResponse {
    fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Reply for a failed step. Internal details are not exposed.
    pub fn from_error(e: &LifError) -> Self {
        if e.is_infrastructure() {
            Self::error("Internal Server Error")
        } else {
            Self::error(e.to_string())
        }
    }
}

/// Collaborators a recovery session needs.
#[derive(Clone, Copy)]
pub struct RecoveryContext<'a> {
    pub pool: &'a SqlitePool,
    pub scheme: PasswordScheme,
    pub mailer: &'a dyn Mailer,
}

/// State of one recovery conversation.
#[derive(Debug, Default)]
pub struct RecoverySession {
    email: Option<String>,
    verified: bool,
}

impl RecoverySession {
    /// Start a new conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the client has proven it holds a valid code.
    pub fn is_verified(&self) -> bool {
        self.verified
    }

    /// Advance the conversation by one client message.
    pub async fn handle(
        &mut self,
        ctx: RecoveryContext<'_>,
        request: RecoveryRequest,
    ) -> Result<RecoveryResponse> {
        if let Some(email) = request.email {
            return self.send_code(ctx, email).await;
        }
        if let Some(code) = request.code {
            return self.check_code(ctx, &code).await;
        }
        if let Some(password) = request.password {
            return self.set_password(ctx, &password).await;
        }
        Ok(RecoveryResponse::error("Bad Request"))
    }

    async fn send_code(&mut self, ctx: RecoveryContext<'_>, email: String) -> Result<RecoveryResponse> {
        if AccountRepository::new(ctx.pool).get_by_email(&email).await?.is_none() {
            return Ok(RecoveryResponse::error("Invalid Email!"));
        }

        let code = generate_recovery_code();
        let expires_at = (Utc::now() + Duration::minutes(RECOVERY_CODE_TTL_MINUTES))
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        RecoveryCodeRepository::new(ctx.pool)
            .create(&email, &code, &expires_at)
            .await?;

        if let Err(e) = ctx.mailer.send(&messages::recovery_code(&email, &code)).await {
            error!(error = %e, "failed to send recovery code");
            return Err(e);
        }

        info!(email = %email, "recovery code sent");
        self.email = Some(email);
        self.verified = false;
        Ok(RecoveryResponse::EmailSent {
            message: "Email Sent".to_string(),
        })
    }

    async fn check_code(&mut self, ctx: RecoveryContext<'_>, code: &str) -> Result<RecoveryResponse> {
        let Some(email) = self.email.as_deref() else {
            return Ok(RecoveryResponse::error("Bad Code"));
        };

        if RecoveryCodeRepository::new(ctx.pool)
            .consume(email, code)
            .await?
            .is_none()
        {
            warn!(email = %email, "bad recovery code");
            return Ok(RecoveryResponse::error("Bad Code"));
        }

        self.verified = true;
        Ok(RecoveryResponse::CodeCorrect {
            message: "Code Correct".to_string(),
        })
    }

    async fn set_password(&mut self, ctx: RecoveryContext<'_>, password: &str) -> Result<RecoveryResponse> {
        let email = match (&self.email, self.verified) {
            (Some(email), true) => email.clone(),
            _ => return Ok(RecoveryResponse::error("You have not authenticated yet")),
        };

        let account = AccountRepository::new(ctx.pool)
            .get_by_email(&email)
            .await?
            .ok_or(LifError::UserNotFound)?;

        update_password(ctx.pool, ctx.scheme, &account.username, password).await?;
        let token = retrieve_token(ctx.pool, &account.username).await?;

        self.email = None;
        self.verified = false;

        info!(username = %account.username, "account recovered");
        Ok(RecoveryResponse::PasswordUpdated {
            username: account.username,
            token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{check_token, create_account, verify_credentials, RegistrationRequest};
    use crate::db::MAX_CODE_ATTEMPTS;
    use crate::mail::RecordingMailer;
    use crate::Database;

    async fn setup() -> Database {
        let db = Database::open_in_memory().await.unwrap();
        create_account(
            db.pool(),
            PasswordScheme::Sha256,
            &RegistrationRequest::new("alice", "alice@x.com", "old-pw"),
        )
        .await
        .unwrap();
        db
    }

    fn email(value: &str) -> RecoveryRequest {
        RecoveryRequest {
            email: Some(value.to_string()),
            ..Default::default()
        }
    }

    fn code(value: &str) -> RecoveryRequest {
        RecoveryRequest {
            code: Some(value.to_string()),
            ..Default::default()
        }
    }

    fn password(value: &str) -> RecoveryRequest {
        RecoveryRequest {
            password: Some(value.to_string()),
            ..Default::default()
        }
    }

    fn sent_code(mailer: &RecordingMailer) -> String {
        let body = mailer.sent().last().unwrap().body.clone();
        let start = body.find("<h2>").unwrap() + 4;
        body[start..start + RECOVERY_CODE_LENGTH].to_string()
    }

    #[test]
    fn test_generate_recovery_code() {
        let code = generate_recovery_code();
        assert_eq!(code.len(), RECOVERY_CODE_LENGTH);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_response_serialization() {
        let json = serde_json::to_value(RecoveryResponse::PasswordUpdated {
            username: "alice".to_string(),
            token: "t".to_string(),
        })
        .unwrap();
        assert_eq!(json["responseType"], "passwordUpdated");
        assert_eq!(json["username"], "alice");

        let json = serde_json::to_value(RecoveryResponse::error("Bad Code")).unwrap();
        assert_eq!(json["responseType"], "error");
        assert_eq!(json["message"], "Bad Code");
    }

    #[tokio::test]
    async fn test_full_recovery() {
        let db = setup().await;
        let mailer = RecordingMailer::new();
        let ctx = RecoveryContext {
            pool: db.pool(),
            scheme: PasswordScheme::Sha256,
            mailer: &mailer,
        };
        let mut session = RecoverySession::new();

        let reply = session.handle(ctx, email("alice@x.com")).await.unwrap();
        assert!(matches!(reply, RecoveryResponse::EmailSent { .. }));
        assert_eq!(mailer.sent()[0].recipient, "alice@x.com");

        let reply = session.handle(ctx, code(&sent_code(&mailer))).await.unwrap();
        assert!(matches!(reply, RecoveryResponse::CodeCorrect { .. }));
        assert!(session.is_verified());

        let reply = session.handle(ctx, password("new-pw")).await.unwrap();
        let RecoveryResponse::PasswordUpdated { username, token } = reply else {
            panic!("unexpected reply: {reply:?}");
        };
        assert_eq!(username, "alice");
        check_token(db.pool(), "alice", &token).await.unwrap();
        verify_credentials(db.pool(), PasswordScheme::Sha256, "alice", "new-pw")
            .await
            .unwrap();
        assert!(!session.is_verified());
    }

    #[tokio::test]
    async fn test_unknown_email() {
        let db = setup().await;
        let mailer = RecordingMailer::new();
        let ctx = RecoveryContext {
            pool: db.pool(),
            scheme: PasswordScheme::Sha256,
            mailer: &mailer,
        };
        let mut session = RecoverySession::new();

        let reply = session.handle(ctx, email("nobody@x.com")).await.unwrap();
        assert_eq!(reply, RecoveryResponse::error("Invalid Email!"));
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_bad_code_and_password_before_code() {
        let db = setup().await;
        let mailer = RecordingMailer::new();
        let ctx = RecoveryContext {
            pool: db.pool(),
            scheme: PasswordScheme::Sha256,
            mailer: &mailer,
        };
        let mut session = RecoverySession::new();

        let reply = session.handle(ctx, password("x")).await.unwrap();
        assert_eq!(reply, RecoveryResponse::error("You have not authenticated yet"));

        let reply = session.handle(ctx, code("00000")).await.unwrap();
        assert_eq!(reply, RecoveryResponse::error("Bad Code"));

        session.handle(ctx, email("alice@x.com")).await.unwrap();
        let real = sent_code(&mailer);
        let wrong = if real == "99999" { "00000" } else { "99999" };
        let reply = session.handle(ctx, code(wrong)).await.unwrap();
        assert_eq!(reply, RecoveryResponse::error("Bad Code"));

        let reply = session.handle(ctx, password("x")).await.unwrap();
        assert_eq!(reply, RecoveryResponse::error("You have not authenticated yet"));

        verify_credentials(db.pool(), PasswordScheme::Sha256, "alice", "old-pw")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_guessing_retires_code() {
        let db = setup().await;
        let mailer = RecordingMailer::new();
        let ctx = RecoveryContext {
            pool: db.pool(),
            scheme: PasswordScheme::Sha256,
            mailer: &mailer,
        };
        let mut session = RecoverySession::new();

        session.handle(ctx, email("alice@x.com")).await.unwrap();
        let real = sent_code(&mailer);

        let wrong: Vec<String> = (0..100_000)
            .map(|n| format!("{n:05}"))
            .filter(|guess| *guess != real)
            .take(MAX_CODE_ATTEMPTS as usize)
            .collect();
        for guess in &wrong {
            let reply = session.handle(ctx, code(guess)).await.unwrap();
            assert_eq!(reply, RecoveryResponse::error("Bad Code"));
        }

        let reply = session.handle(ctx, code(&real)).await.unwrap();
        assert_eq!(reply, RecoveryResponse::error("Bad Code"));
        assert!(!session.is_verified());

        // A freshly mailed code works again.
        session.handle(ctx, email("alice@x.com")).await.unwrap();
        let reply = session.handle(ctx, code(&sent_code(&mailer))).await.unwrap();
        assert!(matches!(reply, RecoveryResponse::CodeCorrect { .. }));
    }

    #[tokio::test]
    async fn test_code_is_single_use() {
        let db = setup().await;
        let mailer = RecordingMailer::new();
        let ctx = RecoveryContext {
            pool: db.pool(),
            scheme: PasswordScheme::Sha256,
            mailer: &mailer,
        };

        let mut first = RecoverySession::new();
        first.handle(ctx, email("alice@x.com")).await.unwrap();
        let sent = sent_code(&mailer);
        first.handle(ctx, code(&sent)).await.unwrap();

        let mut second = RecoverySession::new();
        second.email = Some("alice@x.com".to_string());
        let reply = second.handle(ctx, code(&sent)).await.unwrap();
        assert_eq!(reply, RecoveryResponse::error("Bad Code"));
    }

    #[tokio::test]
    async fn test_empty_message() {
        let db = setup().await;
        let mailer = RecordingMailer::new();
        let ctx = RecoveryContext {
            pool: db.pool(),
            scheme: PasswordScheme::Sha256,
            mailer: &mailer,
        };
        let mut session = RecoverySession::new();

        let reply = session.handle(ctx, RecoveryRequest::default()).await.unwrap();
        assert_eq!(reply, RecoveryResponse::error("Bad Request"));
    }
}

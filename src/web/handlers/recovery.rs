//! Account recovery WebSocket.
//!
//! The client sends one JSON object per message carrying `email`, `code`
//! or `password`; the server answers each with a tagged JSON object. The
//! conversation state lives only as long as the socket.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use tracing::{debug, warn};

use crate::auth::{RecoveryContext, RecoveryRequest, RecoveryResponse, RecoverySession};
use crate::web::state::AppState;

/// GET /account/account_recovery - Upgrade to the recovery WebSocket.
#[utoipa::path(
    get,
    path = "/account/account_recovery",
    tag = "account",
    responses(
        (status = 101, description = "Switching to the recovery WebSocket")
    )
)]
pub async fn account_recovery(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn reply(state: &AppState, session: &mut RecoverySession, text: &str) -> RecoveryResponse {
    let request: RecoveryRequest = match serde_json::from_str(text) {
        Ok(request) => request,
        Err(e) => {
            debug!("Malformed recovery message: {}", e);
            return RecoveryResponse::Error {
                message: "Bad Request".to_string(),
            };
        }
    };

    let ctx = RecoveryContext {
        pool: state.pool(),
        scheme: state.scheme(),
        mailer: state.mailer.as_ref(),
    };

    match session.handle(ctx, request).await {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "recovery step failed");
            RecoveryResponse::from_error(&e)
        }
    }
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let mut session = RecoverySession::new();
    debug!("Recovery session started");

    while let Some(message) = socket.recv().await {
        let text = match message {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => continue,
        };

        let response = reply(&state, &mut session, &text).await;
        let finished = matches!(response, RecoveryResponse::PasswordUpdated { .. });

        match serde_json::to_string(&response) {
            Ok(json) => {
                if socket.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
            Err(e) => warn!("Failed to serialize recovery response: {}", e),
        }

        if finished {
            break;
        }
    }

    debug!("Recovery session ended");
}

//! Message bodies for transactional mail.

use super::EmailMessage;

/// Build the welcome message sent after registration.
pub fn welcome(email: &str, username: &str) -> EmailMessage {
    EmailMessage::new(
        email,
        "Welcome To Lif Platforms",
        format!(
            "<html><body>\
             <h1>Welcome to Lif Platforms, {username}!</h1>\
             <p>Your Lif Account is ready. Use it to sign in to every Lif service.</p>\
             </body></html>"
        ),
    )
}

/// Build the message carrying an account recovery code.
pub fn recovery_code(email: &str, code: &str) -> EmailMessage {
    EmailMessage::new(
        email,
        "Your Lif Recovery Code",
        format!(
            "<html><body>\
             <p>Use the code below to recover your Lif Account.</p>\
             <h2>{code}</h2>\
             <p>The code expires in 15 minutes. If you did not request it, ignore this email.</p>\
             </body></html>"
        ),
    )
}

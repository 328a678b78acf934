use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;

use crate::config;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("SMTP is not configured")]
    NotConfigured,

    #[error("Invalid mail address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build message: {0}")]
    Message(String),

    #[error("SMTP transport error: {0}")]
    Transport(String),
}

/// Send the password-reset email with a link the frontend turns into the
/// reset form. The link embeds the raw token; TTL is stated in the body.
pub async fn send_password_reset(
    to: &str,
    username: &str,
    reset_token: &str,
) -> Result<(), MailError> {
    let mail = &config::config().mail;
    let ttl_minutes = config::config().security.reset_token_ttl_minutes;

    let host = mail.smtp_host.as_deref().ok_or(MailError::NotConfigured)?;

    let reset_url = format!(
        "{}/reset-password?token={}",
        mail.client_url.trim_end_matches('/'),
        reset_token
    );

    let body = format!(
        "Hello {username},\n\n\
         We received a request to reset your password.\n\
         Open the link below to choose a new one (valid for {ttl_minutes} minutes):\n\n\
         {reset_url}\n\n\
         If you did not request this, you can safely ignore this email.\n"
    );

    let message = Message::builder()
        .from(
            mail.from_address
                .parse()
                .map_err(|_| MailError::InvalidAddress(mail.from_address.clone()))?,
        )
        .to(to
            .parse()
            .map_err(|_| MailError::InvalidAddress(to.to_string()))?)
        .subject("Password reset request")
        .header(ContentType::TEXT_PLAIN)
        .body(body)
        .map_err(|e| MailError::Message(e.to_string()))?;

    let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
        .map_err(|e| MailError::Transport(e.to_string()))?
        .port(mail.smtp_port);

    if let (Some(user), Some(pass)) = (&mail.smtp_username, &mail.smtp_password) {
        builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
    }

    let mailer = builder.build();

    mailer
        .send(message)
        .await
        .map(|_| ())
        .map_err(|e| MailError::Transport(e.to_string()))
}

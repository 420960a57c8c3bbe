//! Activation email delivery.
//!
//! `SmtpActivationNotifier` talks to a real SMTP relay through lettre.
//! `LogActivationNotifier` is used when mail delivery is disabled and only
//! writes the activation link to the log.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::MailConfig;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build message: {0}")]
    Message(String),

    #[error("SMTP transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait ActivationNotifier: Send + Sync {
    /// Sends the activation email for `token` to `email`.
    async fn send_activation(&self, email: &str, token: &str) -> Result<(), NotificationError>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}

/// Builds the link the recipient follows to activate the account.
#[must_use]
pub fn activation_link(base_url: &str, token: &str) -> String {
    format!("{}/{token}", base_url.trim_end_matches('/'))
}

/// Picks the notifier matching the mail configuration.
///
/// # Errors
///
/// Returns an error if SMTP is enabled and the transport cannot be built.
pub fn notifier_from_config(
    config: &MailConfig,
) -> Result<Arc<dyn ActivationNotifier>, NotificationError> {
    if config.enabled {
        Ok(Arc::new(SmtpActivationNotifier::new(config.clone())?))
    } else {
        info!("Mail delivery disabled, activation links will only be logged");
        Ok(Arc::new(LogActivationNotifier::new(
            config.activation_url.clone(),
        )))
    }
}

pub struct SmtpActivationNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    config: MailConfig,
}

impl SmtpActivationNotifier {
    /// # Errors
    ///
    /// Returns an error if the sender address is invalid or the relay cannot be set up.
    pub fn new(config: MailConfig) -> Result<Self, NotificationError> {
        let from: Mailbox = format!("{} <{}>", config.from_name, config.from_email)
            .parse()
            .map_err(|e| NotificationError::InvalidAddress(format!("from: {e}")))?;

        let transport = Self::build_transport(&config)?;

        Ok(Self {
            transport,
            from,
            config,
        })
    }

    fn build_transport(
        config: &MailConfig,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotificationError> {
        let builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| NotificationError::Transport(format!("Failed to create relay: {e}")))?
        } else {
            // Plain SMTP for local catchers such as Mailpit
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };

        let mut builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_seconds)));

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(builder.build())
    }

    fn build_message(&self, email: &str, token: &str) -> Result<Message, NotificationError> {
        let to: Mailbox = email
            .parse()
            .map_err(|e| NotificationError::InvalidAddress(format!("to: {e}")))?;

        let link = activation_link(&self.config.activation_url, token);
        let body = format!(
            "Welcome!\n\nPlease activate your account by opening the link below:\n\n{link}\n"
        );

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(self.config.activation_subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| NotificationError::Message(e.to_string()))
    }
}

#[async_trait]
impl ActivationNotifier for SmtpActivationNotifier {
    async fn send_activation(&self, email: &str, token: &str) -> Result<(), NotificationError> {
        let message = self.build_message(email, token)?;

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        debug!(code = %response.code(), "Activation email accepted by relay");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}

pub struct LogActivationNotifier {
    activation_url: String,
}

impl LogActivationNotifier {
    #[must_use]
    pub const fn new(activation_url: String) -> Self {
        Self { activation_url }
    }
}

#[async_trait]
impl ActivationNotifier for LogActivationNotifier {
    async fn send_activation(&self, email: &str, token: &str) -> Result<(), NotificationError> {
        info!(
            email = %email,
            link = %activation_link(&self.activation_url, token),
            "Activation email not delivered (mail disabled)"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

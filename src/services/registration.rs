//! Account registration.
//!
//! Side effects happen in a fixed order: hash the password, draw a token,
//! insert the pending row, then send the activation email. The insert is
//! committed before the email goes out. If sending fails the caller gets
//! [`AccountError::NotificationFailure`] but the pending row stays, its token
//! stays valid, and [`RegistrationService::resend_activation`] can deliver it
//! later. Nothing is rolled back across the network call.

use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::{NewUser, PlaintextPassword, User};
use crate::services::error::AccountError;
use crate::services::notification::ActivationNotifier;
use crate::services::password::CredentialHasher;
use crate::services::token::ActivationTokenGenerator;
use crate::services::user_store::{StoreError, UserStore};

/// Attempts at drawing a token that does not collide with a stored one.
pub const MAX_TOKEN_ATTEMPTS: usize = 3;

/// A registration request that already passed field validation.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: PlaintextPassword,
}

pub struct RegistrationService {
    store: Arc<dyn UserStore>,
    hasher: Arc<dyn CredentialHasher>,
    tokens: Arc<dyn ActivationTokenGenerator>,
    notifier: Arc<dyn ActivationNotifier>,
}

impl RegistrationService {
    #[must_use]
    pub fn new(
        store: Arc<dyn UserStore>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: Arc<dyn ActivationTokenGenerator>,
        notifier: Arc<dyn ActivationNotifier>,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
            notifier,
        }
    }

    /// Creates a pending account and emails its activation token.
    ///
    /// # Errors
    ///
    /// - [`AccountError::DuplicateEmail`] if the email is taken; nothing is stored.
    /// - [`AccountError::NotificationFailure`] if the email could not be sent;
    ///   the pending account is kept.
    pub async fn register(&self, registration: Registration) -> Result<User, AccountError> {
        let Registration {
            username,
            email,
            password,
        } = registration;

        let password_hash = self.hasher.hash(&password).await?;
        drop(password);

        let user = self.insert_with_fresh_token(username, email, password_hash).await?;

        let token = user.activation_token.as_deref().unwrap_or_default();
        if let Err(e) = self.notifier.send_activation(&user.email, token).await {
            warn!(
                user_id = %user.id,
                notifier = self.notifier.name(),
                error = %e,
                "Activation email failed, pending account kept for resend"
            );
            metrics::counter!("activation_notifications_failed_total").increment(1);
            return Err(e.into());
        }

        info!(user_id = %user.id, "Account registered, activation email sent");
        metrics::counter!("accounts_registered_total").increment(1);

        Ok(user)
    }

    async fn insert_with_fresh_token(
        &self,
        username: String,
        email: String,
        password_hash: String,
    ) -> Result<User, AccountError> {
        for attempt in 1..=MAX_TOKEN_ATTEMPTS {
            let new_user = NewUser {
                username: username.clone(),
                email: email.clone(),
                password_hash: password_hash.clone(),
                activation_token: self.tokens.generate(),
            };

            match self.store.insert_pending(new_user).await {
                Ok(user) => return Ok(user),
                Err(StoreError::DuplicateToken) => {
                    warn!(attempt, "Activation token collision, drawing a new one");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(StoreError::DuplicateToken.into())
    }

    /// Re-sends the stored activation token of a pending account.
    ///
    /// Unknown and already active addresses succeed silently so the endpoint
    /// cannot be used to probe for registered emails.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::NotificationFailure`] if the email could not be sent.
    pub async fn resend_activation(&self, email: &str) -> Result<(), AccountError> {
        let Some(user) = self.store.find_by_email(email).await? else {
            return Ok(());
        };

        let Some(token) = user.activation_token.as_deref().filter(|_| user.is_pending()) else {
            return Ok(());
        };

        self.notifier
            .send_activation(&user.email, token)
            .await
            .inspect_err(|e| {
                warn!(user_id = %user.id, error = %e, "Activation email resend failed");
                metrics::counter!("activation_notifications_failed_total").increment(1);
            })?;

        info!(user_id = %user.id, "Activation email re-sent");
        Ok(())
    }
}

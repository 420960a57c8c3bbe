//! Account activation through a single-use token.

use std::sync::Arc;
use tracing::{debug, info};

use crate::services::error::AccountError;
use crate::services::user_store::UserStore;

pub struct ActivationService {
    store: Arc<dyn UserStore>,
}

impl ActivationService {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Activates the pending account holding `token` and clears the token.
    ///
    /// Unknown, already consumed and empty tokens all yield the same error.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::InvalidToken`] if no pending account holds `token`.
    pub async fn activate(&self, token: &str) -> Result<(), AccountError> {
        if token.is_empty() {
            return Err(AccountError::InvalidToken);
        }

        let Some(user) = self.store.find_by_activation_token(token).await? else {
            debug!("Activation attempted with unknown token");
            return Err(AccountError::InvalidToken);
        };

        // A concurrent activation may consume the token between lookup and write.
        if !self.store.activate_by_token(token).await? {
            debug!(user_id = %user.id, "Activation token consumed concurrently");
            return Err(AccountError::InvalidToken);
        }

        info!(user_id = %user.id, "Account activated");
        metrics::counter!("accounts_activated_total").increment(1);
        Ok(())
    }
}

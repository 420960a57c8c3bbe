//! Read access, credential checks and profile updates for accounts.

use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::{Page, PageRequest, PlaintextPassword, User, UserId};
use crate::services::error::AccountError;
use crate::services::password::CredentialHasher;
use crate::services::user_store::UserStore;

pub struct UserService {
    store: Arc<dyn UserStore>,
    hasher: Arc<dyn CredentialHasher>,
}

impl UserService {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self { store, hasher }
    }

    /// # Errors
    ///
    /// Returns [`AccountError::NotFound`] if no account has this id.
    pub async fn get_user(&self, id: UserId) -> Result<User, AccountError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(AccountError::NotFound(id))
    }

    /// Lists accounts, leaving out `caller` when one is known.
    pub async fn list_users(
        &self,
        request: PageRequest,
        caller: Option<UserId>,
    ) -> Result<Page<User>, AccountError> {
        Ok(self.store.list(request, caller).await?)
    }

    /// Checks an email/password pair against the stored hash.
    ///
    /// Pending accounts cannot authenticate.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Unauthenticated`] for unknown emails, wrong
    /// passwords and accounts that are not active yet.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &PlaintextPassword,
    ) -> Result<User, AccountError> {
        let Some((user, password_hash)) = self.store.find_credentials_by_email(email).await?
        else {
            debug!("Authentication failed: unknown email");
            return Err(AccountError::Unauthenticated);
        };

        if !self.hasher.verify(password, &password_hash).await? {
            debug!(user_id = %user.id, "Authentication failed: wrong password");
            return Err(AccountError::Unauthenticated);
        }

        if user.is_pending() {
            debug!(user_id = %user.id, "Authentication refused: account not activated");
            return Err(AccountError::Unauthenticated);
        }

        Ok(user)
    }

    /// Changes the display name of `id`. Only the account itself may do this.
    ///
    /// # Errors
    ///
    /// - [`AccountError::Forbidden`] if `caller` is a different account.
    /// - [`AccountError::NotFound`] if the account disappeared.
    pub async fn update_username(
        &self,
        caller: &User,
        id: UserId,
        username: &str,
    ) -> Result<User, AccountError> {
        if caller.id != id {
            return Err(AccountError::Forbidden(id));
        }

        let updated = self
            .store
            .update_username(id, username)
            .await?
            .ok_or(AccountError::NotFound(id))?;

        info!(user_id = %id, "Username updated");
        Ok(updated)
    }

    pub async fn ping(&self) -> Result<(), AccountError> {
        Ok(self.store.ping().await?)
    }
}

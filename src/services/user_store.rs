//! Storage port for user accounts.
//!
//! The services only see this trait; `db::repositories::user` provides the
//! `SeaORM` implementation.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{NewUser, Page, PageRequest, User, UserId};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email address is already registered")]
    DuplicateEmail,

    #[error("activation token collides with an existing one")]
    DuplicateToken,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for StoreError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a pending account in one statement.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateEmail`] or [`StoreError::DuplicateToken`]
    /// when a unique index rejects the row; nothing is persisted in that case.
    async fn insert_pending(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Same as [`UserStore::find_by_email`] but also returns the stored password hash.
    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, StoreError>;

    async fn find_by_activation_token(&self, token: &str) -> Result<Option<User>, StoreError>;

    /// Compare-and-clear: activates the pending account holding `token` and
    /// clears the token in a single conditional update.
    ///
    /// Returns `false` when no pending account holds the token at write time.
    async fn activate_by_token(&self, token: &str) -> Result<bool, StoreError>;

    /// Pages through all accounts ordered by id, optionally skipping one.
    async fn list(
        &self,
        request: PageRequest,
        exclude: Option<UserId>,
    ) -> Result<Page<User>, StoreError>;

    async fn update_username(
        &self,
        id: UserId,
        username: &str,
    ) -> Result<Option<User>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

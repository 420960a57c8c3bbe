pub mod error;
pub use error::AccountError;

pub mod user_store;
pub use user_store::{StoreError, UserStore};

pub mod password;
pub use password::{Argon2Hasher, CredentialHasher, HashError};

pub mod token;
pub use token::{ActivationTokenGenerator, UuidTokenGenerator};

pub mod notification;
pub use notification::{ActivationNotifier, NotificationError, notifier_from_config};

pub mod registration;
pub use registration::{Registration, RegistrationService};

pub mod activation;
pub use activation::ActivationService;

pub mod user_service;
pub use user_service::UserService;

#[cfg(test)]
pub(crate) mod test_support;

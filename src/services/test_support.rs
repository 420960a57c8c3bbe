//! Fakes shared by the service tests.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::config::SecurityConfig;
use crate::db::Store;
use crate::services::notification::{ActivationNotifier, NotificationError};
use crate::services::password::{Argon2Hasher, CredentialHasher};
use crate::services::token::ActivationTokenGenerator;
use crate::services::user_store::UserStore;

pub async fn memory_store() -> Arc<dyn UserStore> {
    let store = Store::new("sqlite::memory:")
        .await
        .expect("in-memory store");
    Arc::new(store.user_repo())
}

pub fn fast_hasher() -> Arc<dyn CredentialHasher> {
    let config = SecurityConfig {
        argon2_memory_cost_kib: 1024,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
    };
    Arc::new(Argon2Hasher::new(&config).expect("valid argon2 params"))
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("notifier lock").clone()
    }
}

#[async_trait]
impl ActivationNotifier for RecordingNotifier {
    async fn send_activation(&self, email: &str, token: &str) -> Result<(), NotificationError> {
        self.sent
            .lock()
            .expect("notifier lock")
            .push((email.to_string(), token.to_string()));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

pub struct FailingNotifier;

#[async_trait]
impl ActivationNotifier for FailingNotifier {
    async fn send_activation(&self, _email: &str, _token: &str) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("connection refused".to_string()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Hands out the given tokens in order, repeating the last one once exhausted.
pub struct SequenceTokens {
    tokens: Vec<String>,
    next: Mutex<usize>,
}

impl SequenceTokens {
    pub fn new(tokens: &[&str]) -> Self {
        Self {
            tokens: tokens.iter().map(|t| (*t).to_string()).collect(),
            next: Mutex::new(0),
        }
    }
}

impl ActivationTokenGenerator for SequenceTokens {
    fn generate(&self) -> String {
        let mut next = self.next.lock().expect("token lock");
        let index = (*next).min(self.tokens.len() - 1);
        *next += 1;
        self.tokens[index].clone()
    }
}

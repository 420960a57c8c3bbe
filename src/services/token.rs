//! Activation token generation.

use uuid::Uuid;

pub trait ActivationTokenGenerator: Send + Sync {
    /// Returns a fresh, unguessable token.
    fn generate(&self) -> String;
}

/// Random (v4) UUIDs in hyphenated form, 36 characters long.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidTokenGenerator;

impl ActivationTokenGenerator for UuidTokenGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

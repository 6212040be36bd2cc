//! Per-launch control-channel secret generation.

use uuid::Uuid;

/// Strategy for producing the control-channel secret of one launch.
///
/// The caller selects the strategy; production uses [`RandomSecret`],
/// tests inject [`FixedSecret`] so argument vectors are reproducible.
pub trait SecretGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random 32-character hex token. Never reused, never persisted.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSecret;

impl SecretGenerator for RandomSecret {
    fn generate(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// Deterministic secret for tests and debugging.
#[derive(Debug, Clone)]
pub struct FixedSecret(pub String);

impl FixedSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }
}

impl Default for FixedSecret {
    fn default() -> Self {
        Self::new("testingpassword123")
    }
}

impl SecretGenerator for FixedSecret {
    fn generate(&self) -> String {
        self.0.clone()
    }
}

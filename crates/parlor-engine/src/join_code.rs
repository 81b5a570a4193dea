//! Join code issuance.
//!
//! Players type these codes on phones, often reading them off a shared
//! screen, so the alphabet drops every glyph pair people confuse:
//! no `0`/`O`, no `1`/`I`. Six characters over the remaining 32 symbols
//! gives about a billion combinations, which keeps accidental collisions
//! rare but not impossible; issuing therefore probes storage and
//! retries, and storage enforces uniqueness as the final word.

use rand::Rng;

use parlor_store::Store;

use crate::error::EngineError;

/// Every character a join code may contain: A–Z and 2–9, minus the four
/// confusable glyphs `0`, `O`, `1`, `I`.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Tuning for join code issuance.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct JoinCodeConfig {
    /// Characters per code.
    pub length: usize,

    /// How many collisions to tolerate before giving up with
    /// [`EngineError::CodeExhausted`].
    pub max_attempts: u32,
}

impl Default for JoinCodeConfig {
    fn default() -> Self {
        Self {
            length: 6,
            max_attempts: 10,
        }
    }
}

/// Issues join codes that are unique among active sessions.
#[derive(Debug, Clone)]
pub struct JoinCodeIssuer {
    config: JoinCodeConfig,
}

impl JoinCodeIssuer {
    pub fn new(config: JoinCodeConfig) -> Self {
        Self { config }
    }

    /// Draws one candidate code from `rng`. No uniqueness involved;
    /// this is the raw generation step.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        (0..self.config.length)
            .map(|_| {
                let idx = rng.random_range(0..CODE_ALPHABET.len());
                CODE_ALPHABET[idx] as char
            })
            .collect()
    }

    /// Issues a code no *active* session currently holds, probing the
    /// store and redrawing on collision.
    ///
    /// The returned code is reserved by nothing: the caller must write
    /// it promptly, and the write can still fail with a duplicate-code
    /// conflict if another creation wins the race. Completed sessions
    /// do not block reuse of their codes.
    ///
    /// # Errors
    /// [`EngineError::CodeExhausted`] after `max_attempts` collisions.
    pub async fn issue<S: Store>(&self, store: &S) -> Result<String, EngineError> {
        for attempt in 1..=self.config.max_attempts {
            // Fresh handle per draw keeps the future Send; the thread
            // rng must not live across the probe await.
            let code = self.generate(&mut rand::rng());
            if store.session_by_code(&code).await?.is_none() {
                return Ok(code);
            }
            tracing::debug!(attempt, code = %code, "join code collided, redrawing");
        }
        Err(EngineError::CodeExhausted {
            attempts: self.config.max_attempts,
        })
    }

    /// Same as [`issue`](Self::issue) with a caller-supplied random
    /// source, so tests can drive issuance deterministically.
    pub async fn issue_with<S: Store, R: Rng>(
        &self,
        store: &S,
        rng: &mut R,
    ) -> Result<String, EngineError> {
        for attempt in 1..=self.config.max_attempts {
            let code = self.generate(rng);
            if store.session_by_code(&code).await?.is_none() {
                return Ok(code);
            }
            tracing::debug!(attempt, code = %code, "join code collided, redrawing");
        }
        Err(EngineError::CodeExhausted {
            attempts: self.config.max_attempts,
        })
    }
}

impl Default for JoinCodeIssuer {
    fn default() -> Self {
        Self::new(JoinCodeConfig::default())
    }
}

// =========================================================================
// Tests
// =========================================================================

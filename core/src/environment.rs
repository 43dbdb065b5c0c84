//! Injected dependency traits.
//!
//! The clock and the credential hasher are explicit dependencies, constructed
//! once at the composition root and passed down, so tests can substitute
//! deterministic implementations instead of fighting process-wide singletons.

use chrono::{DateTime, Utc};

/// Abstracts time so record timestamps are testable.
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Opaque one-way credential transform.
///
/// The registry uses the same transform both to persist and to verify
/// credentials, so implementations must be deterministic: equal inputs
/// produce equal digests.
pub trait CredentialHasher: Send + Sync {
    /// Digest a plaintext password.
    fn hash(&self, password: &str) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_advances() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}

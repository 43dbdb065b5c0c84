//! # Vendstack Testing
//!
//! Testing utilities shared by the workspace's integration tests:
//!
//! - [`FixedClock`] / [`test_clock`] — deterministic time
//! - [`TempDatabase`] — a scratch SQLite database file that disappears with
//!   the test
//! - [`init_tracing`] — opt-in log output while debugging a test run

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use vendstack_core::environment::Clock;

/// Fixed clock for deterministic tests.
///
/// Always returns the same time, making timestamp assertions reproducible.
///
/// # Example
///
/// ```
/// use vendstack_testing::test_clock;
/// use vendstack_core::environment::Clock;
///
/// let clock = test_clock();
/// assert_eq!(clock.now(), clock.now());
/// ```
#[derive(Debug, Clone)]
pub struct FixedClock {
    time: DateTime<Utc>,
}

impl FixedClock {
    /// Create a fixed clock pinned at `time`.
    #[must_use]
    pub const fn new(time: DateTime<Utc>) -> Self {
        Self { time }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.time
    }
}

/// Default fixed clock for tests (2025-01-01 00:00:00 UTC).
///
/// # Panics
///
/// Panics if the hardcoded timestamp fails to parse, which cannot happen.
#[must_use]
#[allow(clippy::expect_used)]
pub fn test_clock() -> FixedClock {
    FixedClock::new(
        DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .expect("hardcoded timestamp should always parse")
            .with_timezone(&Utc),
    )
}

/// A scratch SQLite database living in a temporary directory.
///
/// The directory (and the database file with it) is removed when the value
/// drops, so every test starts from an empty database.
#[derive(Debug)]
pub struct TempDatabase {
    _dir: TempDir,
    path: PathBuf,
}

impl TempDatabase {
    /// Create a fresh scratch database path.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created; tests cannot
    /// proceed without one.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temporary directory should be creatable");
        let path = dir.path().join("vendstack-test.sqlite");
        Self { _dir: dir, path }
    }

    /// Path of the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for TempDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// Install a fmt subscriber honoring `RUST_LOG`; repeated calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

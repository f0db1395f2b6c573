//! Helpers shared by the PostgreSQL integration tests.
//!
//! Tests that need an embedded cluster can be skipped where one cannot be
//! started. The `SKIP_TEST_CLUSTER` policy lives here so every suite reports
//! the same way.

/// Returns true when `SKIP_TEST_CLUSTER` is "1", "true" or "yes"
/// (case-insensitive).
pub fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Report an embedded cluster setup failure.
///
/// Prints a skip marker and returns `None` when skipping is allowed, and
/// panics otherwise so a broken CI environment fails loudly.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if should_skip_test_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("Test cluster setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
}

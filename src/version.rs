//! minitest version information.
//!
//! The runner's `--version` output and the JSON run report read the same constant.

/// The minitest version string (for example, `0.1.0`).
pub const MINITEST_VERSION: &str = env!("CARGO_PKG_VERSION");

//! Constants used throughout the continuity core crate.
//!
//! Window lengths live in [`ContinuityConfig`](crate::config::ContinuityConfig)
//! because they are tunable; the values here are either defaults for that
//! config or hard caps on candidate list sizes.

/// Default reuse-validity window in hours (7 days).
pub const DEFAULT_VALIDITY_HOURS: i64 = 168;

/// Default observation-deduplication window in hours.
pub const DEFAULT_DEDUP_WINDOW_HOURS: i64 = 24;

/// Default cap on observations returned by the metric-less suggestions
/// fallback.
pub const DEFAULT_SUGGESTION_OBSERVATION_LIMIT: usize = 50;

/// Default continuity-history window in days.
pub const DEFAULT_HISTORY_WINDOW_DAYS: i64 = 30;

/// Hard cap on reusable-assessment candidates returned by the resolver.
pub const REUSABLE_ASSESSMENT_LIMIT: usize = 5;

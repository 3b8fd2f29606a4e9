//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process
//! startup and then passed into core services. The two clinical windows
//! (reuse validity, observation dedup) are deliberately configuration rather
//! than constants: the defaults carry no clinical mandate, so deployments
//! may tune them.

use crate::constants::{
    DEFAULT_DEDUP_WINDOW_HOURS, DEFAULT_HISTORY_WINDOW_DAYS, DEFAULT_SUGGESTION_OBSERVATION_LIMIT,
    DEFAULT_VALIDITY_HOURS,
};
use crate::error::{ContinuityError, ContinuityResult};

/// Engine configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct ContinuityConfig {
    validity_hours: i64,
    dedup_window_hours: i64,
    suggestion_observation_limit: usize,
    history_window_days: i64,
}

impl ContinuityConfig {
    /// Create a new `ContinuityConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`ContinuityError::Precondition`] if any window length is not
    /// strictly positive or the suggestion cap is zero.
    pub fn new(
        validity_hours: i64,
        dedup_window_hours: i64,
        suggestion_observation_limit: usize,
        history_window_days: i64,
    ) -> ContinuityResult<Self> {
        if validity_hours <= 0 {
            return Err(ContinuityError::Precondition(
                "validity_hours must be greater than zero".into(),
            ));
        }
        if dedup_window_hours <= 0 {
            return Err(ContinuityError::Precondition(
                "dedup_window_hours must be greater than zero".into(),
            ));
        }
        if suggestion_observation_limit == 0 {
            return Err(ContinuityError::Precondition(
                "suggestion_observation_limit must be greater than zero".into(),
            ));
        }
        if history_window_days <= 0 {
            return Err(ContinuityError::Precondition(
                "history_window_days must be greater than zero".into(),
            ));
        }

        Ok(Self {
            validity_hours,
            dedup_window_hours,
            suggestion_observation_limit,
            history_window_days,
        })
    }

    /// Reuse-validity window in hours. Callers may override per operation.
    pub fn validity_hours(&self) -> i64 {
        self.validity_hours
    }

    /// Lookback window for observation deduplication, in hours.
    pub fn dedup_window_hours(&self) -> i64 {
        self.dedup_window_hours
    }

    /// Cap on observations in the metric-less suggestions fallback.
    pub fn suggestion_observation_limit(&self) -> usize {
        self.suggestion_observation_limit
    }

    /// Continuity-history horizon in days.
    pub fn history_window_days(&self) -> i64 {
        self.history_window_days
    }
}

impl Default for ContinuityConfig {
    fn default() -> Self {
        Self {
            validity_hours: DEFAULT_VALIDITY_HOURS,
            dedup_window_hours: DEFAULT_DEDUP_WINDOW_HOURS,
            suggestion_observation_limit: DEFAULT_SUGGESTION_OBSERVATION_LIMIT,
            history_window_days: DEFAULT_HISTORY_WINDOW_DAYS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_windows() {
        let cfg = ContinuityConfig::default();
        assert_eq!(cfg.validity_hours(), 168);
        assert_eq!(cfg.dedup_window_hours(), 24);
        assert_eq!(cfg.suggestion_observation_limit(), 50);
        assert_eq!(cfg.history_window_days(), 30);
    }

    #[test]
    fn test_rejects_non_positive_windows() {
        assert!(matches!(
            ContinuityConfig::new(0, 24, 50, 30),
            Err(ContinuityError::Precondition(_))
        ));
        assert!(matches!(
            ContinuityConfig::new(168, -1, 50, 30),
            Err(ContinuityError::Precondition(_))
        ));
        assert!(matches!(
            ContinuityConfig::new(168, 24, 0, 30),
            Err(ContinuityError::Precondition(_))
        ));
        assert!(matches!(
            ContinuityConfig::new(168, 24, 50, 0),
            Err(ContinuityError::Precondition(_))
        ));
        assert!(ContinuityConfig::new(72, 12, 20, 14).is_ok());
    }
}

//! Shared value types for the continuity engine.
//!
//! This crate holds the `MetricValue` tagged union used for clinical data
//! points. Deduplication correctness depends on value comparison being
//! type-aware, so equality is defined per tag here rather than left to a
//! generic serialize-and-compare shortcut.

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing metric values.
#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    /// The numeric payload was NaN or infinite.
    #[error("numeric metric values must be finite")]
    NonFiniteNumber,
    /// A categorical code was empty or whitespace-only.
    #[error("categorical codes cannot be empty")]
    EmptyCode,
}

/// A single clinical data point value.
///
/// Values are tagged by kind and compared per tag: two values of different
/// kinds are never equal, and each kind uses the comparison appropriate to
/// its payload. Wire form is internally tagged:
/// `{"type": "numeric", "value": 7.0}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MetricValue {
    /// A measured quantity (score, reading, level).
    Numeric(f64),
    /// Free-text response.
    Text(String),
    /// A code drawn from a closed answer set.
    Categorical(String),
    /// Structured payload (e.g. a blood-pressure pair) kept as JSON.
    Structured(serde_json::Value),
}

impl MetricValue {
    /// Creates a numeric value, rejecting NaN and infinities.
    ///
    /// NaN would break equality (dedup would never match) so it is refused
    /// at the boundary rather than special-cased in every comparison.
    pub fn numeric(value: f64) -> Result<Self, ValueError> {
        if !value.is_finite() {
            return Err(ValueError::NonFiniteNumber);
        }
        Ok(Self::Numeric(value))
    }

    /// Creates a categorical value from a non-empty code.
    pub fn categorical(code: impl AsRef<str>) -> Result<Self, ValueError> {
        let trimmed = code.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValueError::EmptyCode);
        }
        Ok(Self::Categorical(trimmed.to_owned()))
    }

    /// Returns the numeric payload, if this value carries one.
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            Self::Numeric(n) => Some(*n),
            _ => None,
        }
    }

    /// Short kind label, used in notes and log output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Numeric(_) => "numeric",
            Self::Text(_) => "text",
            Self::Categorical(_) => "categorical",
            Self::Structured(_) => "structured",
        }
    }
}

impl PartialEq for MetricValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Numeric(a), Self::Numeric(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Categorical(a), Self::Categorical(b)) => a == b,
            // serde_json::Value compares structurally, which is exactly the
            // deep equality dedup needs for structured payloads.
            (Self::Structured(a), Self::Structured(b)) => a == b,
            _ => false,
        }
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        Self::Numeric(value)
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Text(s) | Self::Categorical(s) => write!(f, "{s}"),
            Self::Structured(v) => write!(f, "{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_rejects_nan_and_infinity() {
        assert!(matches!(
            MetricValue::numeric(f64::NAN),
            Err(ValueError::NonFiniteNumber)
        ));
        assert!(matches!(
            MetricValue::numeric(f64::INFINITY),
            Err(ValueError::NonFiniteNumber)
        ));
        assert!(MetricValue::numeric(7.0).is_ok());
    }

    #[test]
    fn test_categorical_rejects_empty_code() {
        assert!(matches!(
            MetricValue::categorical("   "),
            Err(ValueError::EmptyCode)
        ));
        let value = MetricValue::categorical(" mild ").unwrap();
        assert_eq!(value, MetricValue::Categorical("mild".into()));
    }

    #[test]
    fn test_equality_is_per_tag() {
        assert_eq!(MetricValue::Numeric(7.0), MetricValue::Numeric(7.0));
        assert_ne!(MetricValue::Numeric(7.0), MetricValue::Numeric(7.5));
        assert_eq!(
            MetricValue::Text("stable".into()),
            MetricValue::Text("stable".into())
        );
        // Same rendered content, different tags: never equal.
        assert_ne!(
            MetricValue::Text("7".into()),
            MetricValue::Categorical("7".into())
        );
        assert_ne!(MetricValue::Numeric(1.0), MetricValue::Text("1".into()));
    }

    #[test]
    fn test_structured_equality_is_deep() {
        let a = MetricValue::Structured(json!({"systolic": 120, "diastolic": 80}));
        let b = MetricValue::Structured(json!({"diastolic": 80, "systolic": 120}));
        let c = MetricValue::Structured(json!({"systolic": 121, "diastolic": 80}));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_wire_form_is_internally_tagged() {
        let value = MetricValue::Numeric(7.0);
        let encoded = serde_json::to_value(&value).unwrap();
        assert_eq!(encoded, json!({"type": "numeric", "value": 7.0}));

        let decoded: MetricValue =
            serde_json::from_value(json!({"type": "text", "value": "improving"})).unwrap();
        assert_eq!(decoded, MetricValue::Text("improving".into()));
    }

    #[test]
    fn test_as_numeric() {
        assert_eq!(MetricValue::Numeric(3.5).as_numeric(), Some(3.5));
        assert_eq!(MetricValue::Text("3.5".into()).as_numeric(), None);
    }
}

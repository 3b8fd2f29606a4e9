//! Domain records and request/outcome types for the continuity engine.
//!
//! Records are immutable once created: the engine never mutates a stored
//! observation or assessment, and reuse always produces a fresh record
//! carrying prior values forward, so every clinical encounter has its own
//! auditable row.

use chrono::{DateTime, Utc};
use continuity_types::MetricValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// How an observation entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObservationSource {
    Device,
    Manual,
    Other,
}

/// The clinical setting an observation was recorded in.
///
/// Context drives the relevance priority table: monitored data outranks
/// enrollment intake, which outranks routine follow-up, which outranks
/// wellness self-reports. Unclassified data ranks last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObservationContext {
    ClinicalMonitoring,
    ProgramEnrollment,
    RoutineFollowup,
    Wellness,
    Unclassified,
}

impl ObservationContext {
    /// Relevance priority; lower is more relevant.
    pub fn priority_rank(&self) -> u8 {
        match self {
            Self::ClinicalMonitoring => 1,
            Self::ProgramEnrollment => 2,
            Self::RoutineFollowup => 3,
            Self::Wellness => 4,
            Self::Unclassified => 5,
        }
    }
}

/// A single recorded metric data point for a patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricObservation {
    pub id: Uuid,
    pub patient_id: Uuid,
    /// The measured quantity or category, an opaque code (e.g. `"pain"`).
    pub metric_id: String,
    pub value: MetricValue,
    pub source: ObservationSource,
    pub context: ObservationContext,
    /// Immutable once set.
    pub recorded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinician_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrollment_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A completed assessment for a patient.
///
/// `responses` is keyed by the template's metric keys and must be a subset
/// of them; `score` is either absent or produced by the configured
/// [`AssessmentScorer`](crate::writer::AssessmentScorer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub template_id: String,
    pub responses: BTreeMap<String, MetricValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub completed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinician_id: Option<Uuid>,
    /// Provenance note (e.g. which record the responses were reused from).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One entry in an assessment template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateItem {
    pub metric_key: String,
    pub metric_id: String,
    pub required: bool,
}

/// An assessment template: the ordered list of metrics an assessment of
/// this kind must or may contain. Read-only to this engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub items: Vec<TemplateItem>,
}

impl Template {
    /// Metric ids of the required items, in template order.
    pub fn required_metric_ids(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|item| item.required)
            .map(|item| item.metric_id.clone())
            .collect()
    }

    /// Looks up the metric key declared for a metric id.
    pub fn metric_key_for(&self, metric_id: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|item| item.metric_id == metric_id)
            .map(|item| item.metric_key.as_str())
    }
}

/// Minimal clinician reference for presentation joins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicianRef {
    pub id: Uuid,
    pub display_name: String,
}

/// Where the data behind a continuity decision came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source_type", rename_all = "snake_case")]
pub enum ReuseSource {
    /// Responses and score copied verbatim from a prior assessment.
    Assessment { source_id: Uuid },
    /// Responses synthesized from reusable observations.
    Observations { source_ids: Vec<Uuid> },
    /// No reusable data existed; a genuinely new record was created.
    None,
}

/// The outcome of one assessment-creation decision.
///
/// Every branch of the decision ladder persists a new [`AssessmentRecord`];
/// `continuity_used` says whether its content was carried forward from
/// prior data, and `source` says from where.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuityDecision {
    pub record: AssessmentRecord,
    pub continuity_used: bool,
    #[serde(flatten)]
    pub source: ReuseSource,
    pub message: String,
}

/// The outcome of one observation-creation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationOutcome {
    pub observation: MetricObservation,
    /// True when an equal recent observation was returned instead of a new
    /// row being written.
    pub continuity_used: bool,
}

/// Request to record a new assessment encounter.
#[derive(Debug, Clone)]
pub struct NewAssessmentRequest {
    pub patient_id: Uuid,
    pub clinician_id: Option<Uuid>,
    pub template_id: String,
    /// Skip all reuse and force a genuinely new record.
    pub force_new: bool,
}

/// Per-call knobs for assessment creation.
#[derive(Debug, Clone)]
pub struct AssessmentOptions {
    pub allow_observation_reuse: bool,
    pub allow_assessment_reuse: bool,
    /// Overrides the configured reuse-validity window when set.
    pub validity_hours: Option<i64>,
}

impl Default for AssessmentOptions {
    fn default() -> Self {
        Self {
            allow_observation_reuse: true,
            allow_assessment_reuse: true,
            validity_hours: None,
        }
    }
}

/// Request to record a new metric observation.
#[derive(Debug, Clone)]
pub struct NewObservationRequest {
    pub patient_id: Uuid,
    pub clinician_id: Option<Uuid>,
    pub metric_id: String,
    pub value: MetricValue,
    pub source: ObservationSource,
    pub context: ObservationContext,
    pub enrollment_id: Option<Uuid>,
    pub organization_id: Option<Uuid>,
    pub notes: Option<String>,
}

impl NewObservationRequest {
    /// Starts a request with the defaults callers usually want: manual
    /// entry in a clinical-monitoring context.
    pub fn new(patient_id: Uuid, metric_id: impl Into<String>, value: MetricValue) -> Self {
        Self {
            patient_id,
            clinician_id: None,
            metric_id: metric_id.into(),
            value,
            source: ObservationSource::Manual,
            context: ObservationContext::ClinicalMonitoring,
            enrollment_id: None,
            organization_id: None,
            notes: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> Template {
        Template {
            id: "phq-2".into(),
            name: "PHQ-2".into(),
            category: Some("mental_health".into()),
            items: vec![
                TemplateItem {
                    metric_key: "interest".into(),
                    metric_id: "phq.interest".into(),
                    required: true,
                },
                TemplateItem {
                    metric_key: "mood".into(),
                    metric_id: "phq.mood".into(),
                    required: true,
                },
                TemplateItem {
                    metric_key: "comment".into(),
                    metric_id: "phq.comment".into(),
                    required: false,
                },
            ],
        }
    }

    #[test]
    fn test_priority_table_order() {
        assert_eq!(ObservationContext::ClinicalMonitoring.priority_rank(), 1);
        assert_eq!(ObservationContext::ProgramEnrollment.priority_rank(), 2);
        assert_eq!(ObservationContext::RoutineFollowup.priority_rank(), 3);
        assert_eq!(ObservationContext::Wellness.priority_rank(), 4);
        assert_eq!(ObservationContext::Unclassified.priority_rank(), 5);
    }

    #[test]
    fn test_required_metric_ids_preserve_template_order() {
        assert_eq!(
            template().required_metric_ids(),
            vec!["phq.interest".to_string(), "phq.mood".to_string()]
        );
    }

    #[test]
    fn test_metric_key_lookup() {
        let t = template();
        assert_eq!(t.metric_key_for("phq.mood"), Some("mood"));
        assert_eq!(t.metric_key_for("unknown"), None);
    }

    #[test]
    fn test_reuse_source_wire_names() {
        let encoded = serde_json::to_value(ReuseSource::None).unwrap();
        assert_eq!(encoded, serde_json::json!({"source_type": "none"}));

        let encoded =
            serde_json::to_value(ReuseSource::Observations { source_ids: vec![] }).unwrap();
        assert_eq!(encoded["source_type"], "observations");
    }

    #[test]
    fn test_enum_wire_names() {
        let encoded = serde_json::to_value(ObservationContext::ClinicalMonitoring).unwrap();
        assert_eq!(encoded, serde_json::json!("CLINICAL_MONITORING"));
        let decoded: ObservationSource = serde_json::from_str("\"DEVICE\"").unwrap();
        assert_eq!(decoded, ObservationSource::Device);
    }
}

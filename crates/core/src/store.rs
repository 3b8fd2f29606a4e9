//! Abstract interface to the clinical record store.
//!
//! Persistence is an external collaborator: the engine only consumes the
//! query/insert operations below and never owns connections, transactions,
//! or timeouts. Implementations are expected to be database- or
//! network-backed; [`memory::MemoryStore`] ships as the reference
//! implementation and test fixture.
//!
//! Filter fields are conjunctive. The reuse policy's `DEVICE`-or-monitored
//! disjunction is applied by the resolver after querying, so backends only
//! need plain AND semantics.

use crate::error::StorageError;
use crate::model::{
    AssessmentRecord, ClinicianRef, MetricObservation, ObservationContext, ObservationSource,
    Template,
};
use chrono::{DateTime, Utc};
use continuity_types::MetricValue;
use std::collections::BTreeMap;
use uuid::Uuid;

pub mod memory;

/// Conjunctive filter over stored observations.
#[derive(Debug, Clone, Default)]
pub struct ObservationFilter {
    pub patient_id: Option<Uuid>,
    pub metric_ids: Option<Vec<String>>,
    /// Inclusive lower bound on `recorded_at`.
    pub recorded_after: Option<DateTime<Utc>>,
    pub source: Option<ObservationSource>,
    pub context: Option<ObservationContext>,
}

impl ObservationFilter {
    /// Filter scoped to one patient.
    pub fn for_patient(patient_id: Uuid) -> Self {
        Self {
            patient_id: Some(patient_id),
            ..Self::default()
        }
    }
}

/// Conjunctive filter over stored assessments.
#[derive(Debug, Clone, Default)]
pub struct AssessmentFilter {
    pub patient_id: Option<Uuid>,
    pub template_id: Option<String>,
    /// Inclusive lower bound on `completed_at`.
    pub completed_after: Option<DateTime<Utc>>,
}

impl AssessmentFilter {
    /// Filter scoped to one patient.
    pub fn for_patient(patient_id: Uuid) -> Self {
        Self {
            patient_id: Some(patient_id),
            ..Self::default()
        }
    }
}

/// Sort order for assessment queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssessmentOrder {
    CompletedDesc,
    CompletedAsc,
}

/// Offset/limit window for paginated queries.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Page {
    /// A page starting at the first row.
    pub fn first(limit: usize) -> Self {
        Self { limit, offset: 0 }
    }
}

/// Insert payload for an observation. The store assigns the id; the engine
/// stamps `recorded_at` from its injected clock.
#[derive(Debug, Clone)]
pub struct ObservationDraft {
    pub patient_id: Uuid,
    pub metric_id: String,
    pub value: MetricValue,
    pub source: ObservationSource,
    pub context: ObservationContext,
    pub recorded_at: DateTime<Utc>,
    pub clinician_id: Option<Uuid>,
    pub enrollment_id: Option<Uuid>,
    pub organization_id: Option<Uuid>,
    pub notes: Option<String>,
}

/// Insert payload for an assessment. The store assigns the id.
#[derive(Debug, Clone)]
pub struct AssessmentDraft {
    pub patient_id: Uuid,
    pub template_id: String,
    pub responses: BTreeMap<String, MetricValue>,
    pub score: Option<f64>,
    pub completed_at: DateTime<Utc>,
    pub clinician_id: Option<Uuid>,
    pub notes: Option<String>,
}

/// Read/write operations the engine needs from durable storage.
///
/// Implementations own their timeout and connection policy; the engine
/// never retries a failed call.
pub trait RecordStore: Send + Sync {
    fn query_observations(
        &self,
        filter: &ObservationFilter,
    ) -> impl std::future::Future<Output = Result<Vec<MetricObservation>, StorageError>> + Send;

    fn insert_observation(
        &self,
        draft: ObservationDraft,
    ) -> impl std::future::Future<Output = Result<MetricObservation, StorageError>> + Send;

    fn query_assessments(
        &self,
        filter: &AssessmentFilter,
        order: AssessmentOrder,
        page: Option<Page>,
    ) -> impl std::future::Future<Output = Result<Vec<AssessmentRecord>, StorageError>> + Send;

    fn insert_assessment(
        &self,
        draft: AssessmentDraft,
    ) -> impl std::future::Future<Output = Result<AssessmentRecord, StorageError>> + Send;

    fn get_template(
        &self,
        template_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Template>, StorageError>> + Send;

    fn count_assessments(
        &self,
        filter: &AssessmentFilter,
    ) -> impl std::future::Future<Output = Result<u64, StorageError>> + Send;

    fn get_clinician(
        &self,
        clinician_id: Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ClinicianRef>, StorageError>> + Send;
}

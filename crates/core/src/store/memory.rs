//! In-memory record store.
//!
//! Reference implementation of [`RecordStore`] over mutex-guarded tables.
//! It honours every filter, order, and page combination the trait defines,
//! which makes it the fixture all engine tests run against, and a usable
//! backend for embedders that do not need durability.

use super::{
    AssessmentDraft, AssessmentFilter, AssessmentOrder, ObservationDraft, ObservationFilter, Page,
    RecordStore,
};
use crate::error::StorageError;
use crate::model::{AssessmentRecord, ClinicianRef, MetricObservation, Template};
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Tables {
    observations: Vec<MetricObservation>,
    assessments: Vec<AssessmentRecord>,
    templates: Vec<Template>,
    clinicians: Vec<ClinicianRef>,
}

/// Mutex-guarded in-memory tables.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a template. Replaces any existing template with the same id.
    pub fn put_template(&self, template: Template) {
        let mut tables = self.lock();
        tables.templates.retain(|t| t.id != template.id);
        tables.templates.push(template);
    }

    /// Seeds a clinician for history joins.
    pub fn put_clinician(&self, clinician: ClinicianRef) {
        let mut tables = self.lock();
        tables.clinicians.retain(|c| c.id != clinician.id);
        tables.clinicians.push(clinician);
    }

    /// Number of stored observations. Tests use this to pin dedup behaviour.
    pub fn observation_count(&self) -> usize {
        self.lock().observations.len()
    }

    /// Number of stored assessments.
    pub fn assessment_count(&self) -> usize {
        self.lock().assessments.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        // A poisoned lock means a panic mid-mutation in another test thread;
        // the tables are plain data, so continuing with them is sound.
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn matches_observation(filter: &ObservationFilter, obs: &MetricObservation) -> bool {
    if let Some(patient_id) = filter.patient_id {
        if obs.patient_id != patient_id {
            return false;
        }
    }
    if let Some(metric_ids) = &filter.metric_ids {
        if !metric_ids.iter().any(|m| *m == obs.metric_id) {
            return false;
        }
    }
    if let Some(cutoff) = filter.recorded_after {
        if obs.recorded_at < cutoff {
            return false;
        }
    }
    if let Some(source) = filter.source {
        if obs.source != source {
            return false;
        }
    }
    if let Some(context) = filter.context {
        if obs.context != context {
            return false;
        }
    }
    true
}

fn matches_assessment(filter: &AssessmentFilter, record: &AssessmentRecord) -> bool {
    if let Some(patient_id) = filter.patient_id {
        if record.patient_id != patient_id {
            return false;
        }
    }
    if let Some(template_id) = &filter.template_id {
        if record.template_id != *template_id {
            return false;
        }
    }
    if let Some(cutoff) = filter.completed_after {
        if record.completed_at < cutoff {
            return false;
        }
    }
    true
}

impl RecordStore for MemoryStore {
    async fn query_observations(
        &self,
        filter: &ObservationFilter,
    ) -> Result<Vec<MetricObservation>, StorageError> {
        let tables = self.lock();
        Ok(tables
            .observations
            .iter()
            .filter(|obs| matches_observation(filter, obs))
            .cloned()
            .collect())
    }

    async fn insert_observation(
        &self,
        draft: ObservationDraft,
    ) -> Result<MetricObservation, StorageError> {
        let observation = MetricObservation {
            id: Uuid::new_v4(),
            patient_id: draft.patient_id,
            metric_id: draft.metric_id,
            value: draft.value,
            source: draft.source,
            context: draft.context,
            recorded_at: draft.recorded_at,
            clinician_id: draft.clinician_id,
            enrollment_id: draft.enrollment_id,
            organization_id: draft.organization_id,
            notes: draft.notes,
        };
        self.lock().observations.push(observation.clone());
        Ok(observation)
    }

    async fn query_assessments(
        &self,
        filter: &AssessmentFilter,
        order: AssessmentOrder,
        page: Option<Page>,
    ) -> Result<Vec<AssessmentRecord>, StorageError> {
        let tables = self.lock();
        let mut records: Vec<AssessmentRecord> = tables
            .assessments
            .iter()
            .filter(|record| matches_assessment(filter, record))
            .cloned()
            .collect();

        match order {
            AssessmentOrder::CompletedDesc => {
                records.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
            }
            AssessmentOrder::CompletedAsc => {
                records.sort_by(|a, b| a.completed_at.cmp(&b.completed_at));
            }
        }

        if let Some(page) = page {
            records = records
                .into_iter()
                .skip(page.offset)
                .take(page.limit)
                .collect();
        }

        Ok(records)
    }

    async fn insert_assessment(
        &self,
        draft: AssessmentDraft,
    ) -> Result<AssessmentRecord, StorageError> {
        let record = AssessmentRecord {
            id: Uuid::new_v4(),
            patient_id: draft.patient_id,
            template_id: draft.template_id,
            responses: draft.responses,
            score: draft.score,
            completed_at: draft.completed_at,
            clinician_id: draft.clinician_id,
            notes: draft.notes,
        };
        self.lock().assessments.push(record.clone());
        Ok(record)
    }

    async fn get_template(&self, template_id: &str) -> Result<Option<Template>, StorageError> {
        let tables = self.lock();
        Ok(tables
            .templates
            .iter()
            .find(|t| t.id == template_id)
            .cloned())
    }

    async fn count_assessments(&self, filter: &AssessmentFilter) -> Result<u64, StorageError> {
        let tables = self.lock();
        Ok(tables
            .assessments
            .iter()
            .filter(|record| matches_assessment(filter, record))
            .count() as u64)
    }

    async fn get_clinician(&self, clinician_id: Uuid) -> Result<Option<ClinicianRef>, StorageError> {
        let tables = self.lock();
        Ok(tables
            .clinicians
            .iter()
            .find(|c| c.id == clinician_id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ObservationContext, ObservationSource};
    use chrono::{DateTime, Duration, Utc};
    use continuity_types::MetricValue;
    use std::collections::BTreeMap;

    fn base_time() -> DateTime<Utc> {
        "2026-03-01T12:00:00Z".parse().unwrap()
    }

    fn observation_draft(
        patient_id: Uuid,
        metric_id: &str,
        recorded_at: DateTime<Utc>,
    ) -> ObservationDraft {
        ObservationDraft {
            patient_id,
            metric_id: metric_id.into(),
            value: MetricValue::Numeric(5.0),
            source: ObservationSource::Manual,
            context: ObservationContext::ClinicalMonitoring,
            recorded_at,
            clinician_id: None,
            enrollment_id: None,
            organization_id: None,
            notes: None,
        }
    }

    fn assessment_draft(patient_id: Uuid, completed_at: DateTime<Utc>) -> AssessmentDraft {
        AssessmentDraft {
            patient_id,
            template_id: "phq-2".into(),
            responses: BTreeMap::new(),
            score: None,
            completed_at,
            clinician_id: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_observation_filter_is_conjunctive() {
        let store = MemoryStore::new();
        let patient = Uuid::new_v4();
        let other = Uuid::new_v4();

        store
            .insert_observation(observation_draft(patient, "pain", base_time()))
            .await
            .unwrap();
        store
            .insert_observation(observation_draft(patient, "mood", base_time()))
            .await
            .unwrap();
        store
            .insert_observation(observation_draft(other, "pain", base_time()))
            .await
            .unwrap();

        let mut filter = ObservationFilter::for_patient(patient);
        filter.metric_ids = Some(vec!["pain".into()]);
        let found = store.query_observations(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].patient_id, patient);
        assert_eq!(found[0].metric_id, "pain");
    }

    #[tokio::test]
    async fn test_recorded_after_is_inclusive() {
        let store = MemoryStore::new();
        let patient = Uuid::new_v4();
        let cutoff = base_time();

        store
            .insert_observation(observation_draft(patient, "pain", cutoff))
            .await
            .unwrap();
        store
            .insert_observation(observation_draft(
                patient,
                "pain",
                cutoff - Duration::seconds(1),
            ))
            .await
            .unwrap();

        let mut filter = ObservationFilter::for_patient(patient);
        filter.recorded_after = Some(cutoff);
        let found = store.query_observations(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].recorded_at, cutoff);
    }

    #[tokio::test]
    async fn test_assessment_order_and_page() {
        let store = MemoryStore::new();
        let patient = Uuid::new_v4();

        for hours in 0..4 {
            store
                .insert_assessment(assessment_draft(
                    patient,
                    base_time() - Duration::hours(hours),
                ))
                .await
                .unwrap();
        }

        let filter = AssessmentFilter::for_patient(patient);
        let page = store
            .query_assessments(
                &filter,
                AssessmentOrder::CompletedDesc,
                Some(Page { limit: 2, offset: 1 }),
            )
            .await
            .unwrap();

        assert_eq!(page.len(), 2);
        assert_eq!(page[0].completed_at, base_time() - Duration::hours(1));
        assert_eq!(page[1].completed_at, base_time() - Duration::hours(2));

        assert_eq!(store.count_assessments(&filter).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_template_and_clinician_lookup() {
        let store = MemoryStore::new();
        assert!(store.get_template("missing").await.unwrap().is_none());

        store.put_template(Template {
            id: "phq-2".into(),
            name: "PHQ-2".into(),
            category: None,
            items: vec![],
        });
        let found = store.get_template("phq-2").await.unwrap().unwrap();
        assert_eq!(found.name, "PHQ-2");

        let clinician = ClinicianRef {
            id: Uuid::new_v4(),
            display_name: "Dr. Osei".into(),
        };
        store.put_clinician(clinician.clone());
        assert_eq!(
            store.get_clinician(clinician.id).await.unwrap(),
            Some(clinician)
        );
    }
}

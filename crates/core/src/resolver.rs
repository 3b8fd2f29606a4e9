//! Reuse resolution: what recent data can stand in for a new encounter.
//!
//! The resolver answers reuse questions at two granularities: per metric
//! (observations) and per template (whole assessments). It is request-scoped
//! and stateless; every call issues fresh queries against the record store
//! at decision time, so "current" means read-committed, not snapshot.

use crate::clock::Clock;
use crate::constants::REUSABLE_ASSESSMENT_LIMIT;
use crate::error::{ContinuityError, ContinuityResult};
use crate::model::{AssessmentRecord, MetricObservation, ObservationContext, ObservationSource};
use crate::ranker::most_relevant;
use crate::store::{AssessmentFilter, AssessmentOrder, ObservationFilter, Page, RecordStore};
use chrono::Duration;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Only monitored-quality data may be reused in place of a new encounter:
/// device readings, or anything captured in a clinical-monitoring context.
/// Fresh low-confidence self-reports never qualify, regardless of recency.
fn qualifies_for_reuse(observation: &MetricObservation) -> bool {
    observation.source == ObservationSource::Device
        || observation.context == ObservationContext::ClinicalMonitoring
}

/// Request-scoped reuse lookups against a record store.
#[derive(Debug, Clone, Copy)]
pub struct ReuseResolver<'a, S, C> {
    store: &'a S,
    clock: &'a C,
}

impl<'a, S: RecordStore, C: Clock> ReuseResolver<'a, S, C> {
    pub fn new(store: &'a S, clock: &'a C) -> Self {
        Self { store, clock }
    }

    /// Finds at most one reusable observation per requested metric.
    ///
    /// Observations recorded at or after `now - validity_hours` are
    /// considered; those outside the reuse policy (neither device-sourced
    /// nor clinically monitored) are discarded; the survivors are grouped by
    /// metric and ranked, keeping one representative per group. Metrics with
    /// no qualifying candidate are simply absent from the result.
    ///
    /// # Errors
    ///
    /// Returns [`ContinuityError::Precondition`] if `validity_hours <= 0`,
    /// or [`ContinuityError::Storage`] if the query fails.
    pub async fn find_reusable_observations(
        &self,
        patient_id: Uuid,
        metric_ids: &[String],
        validity_hours: i64,
    ) -> ContinuityResult<BTreeMap<String, MetricObservation>> {
        let cutoff = self.cutoff(validity_hours)?;

        let filter = ObservationFilter {
            patient_id: Some(patient_id),
            metric_ids: Some(metric_ids.to_vec()),
            recorded_after: Some(cutoff),
            source: None,
            context: None,
        };
        let candidates = self.store.query_observations(&filter).await?;

        let mut groups: BTreeMap<String, Vec<MetricObservation>> = BTreeMap::new();
        for observation in candidates.into_iter().filter(qualifies_for_reuse) {
            groups
                .entry(observation.metric_id.clone())
                .or_default()
                .push(observation);
        }

        let selected: BTreeMap<String, MetricObservation> = groups
            .into_iter()
            .map(|(metric_id, group)| {
                let winner = most_relevant(&group).clone();
                (metric_id, winner)
            })
            .collect();

        tracing::debug!(
            %patient_id,
            requested = metric_ids.len(),
            resolved = selected.len(),
            "resolved reusable observations"
        );

        Ok(selected)
    }

    /// Finds recent completed assessments of the given template, newest
    /// first, capped at [`REUSABLE_ASSESSMENT_LIMIT`] candidates. Callers
    /// needing more must lower `validity_hours` or page externally.
    ///
    /// # Errors
    ///
    /// Returns [`ContinuityError::Precondition`] if `validity_hours <= 0`,
    /// or [`ContinuityError::Storage`] if the query fails.
    pub async fn find_reusable_assessments(
        &self,
        patient_id: Uuid,
        template_id: &str,
        validity_hours: i64,
    ) -> ContinuityResult<Vec<AssessmentRecord>> {
        let cutoff = self.cutoff(validity_hours)?;

        let filter = AssessmentFilter {
            patient_id: Some(patient_id),
            template_id: Some(template_id.to_owned()),
            completed_after: Some(cutoff),
        };
        let found = self
            .store
            .query_assessments(
                &filter,
                AssessmentOrder::CompletedDesc,
                Some(Page::first(REUSABLE_ASSESSMENT_LIMIT)),
            )
            .await?;

        Ok(found)
    }

    fn cutoff(&self, validity_hours: i64) -> ContinuityResult<chrono::DateTime<chrono::Utc>> {
        if validity_hours <= 0 {
            return Err(ContinuityError::Precondition(
                "validity_hours must be greater than zero".into(),
            ));
        }
        Ok(self.clock.now() - Duration::hours(validity_hours))
    }
}

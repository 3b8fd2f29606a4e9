//! Read-only continuity views: reuse suggestions and decision history.
//!
//! Nothing here writes. Suggestions are best-effort per category: the
//! assessment and observation sub-queries are independent, and a failure in
//! one degrades the response (that category is omitted and the result is
//! marked partial) instead of failing the whole call.

use crate::clock::Clock;
use crate::config::ContinuityConfig;
use crate::error::ContinuityResult;
use crate::model::{AssessmentRecord, MetricObservation};
use crate::resolver::ReuseResolver;
use crate::store::{
    AssessmentFilter, AssessmentOrder, ObservationFilter, Page, RecordStore,
};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// What a recommendation tells the caller to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    AssessmentReuse,
    ObservationReuse,
    NewBaseline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationPriority {
    High,
    Medium,
    Low,
}

/// One entry in the suggestions recommendation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub priority: RecommendationPriority,
    pub message: String,
}

/// Aggregated reuse candidates plus the derived recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuitySuggestions {
    pub reusable_assessments: Vec<AssessmentRecord>,
    pub reusable_observations: Vec<MetricObservation>,
    pub recommendations: Vec<Recommendation>,
    /// True when a sub-query failed and its category was omitted, so the
    /// recommendations were generated from partial data.
    pub partial: bool,
}

/// One continuity-history row, joined for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub assessment: AssessmentRecord,
    pub template_name: Option<String>,
    pub template_category: Option<String>,
    pub clinician_name: Option<String>,
}

/// A page of continuity history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuityHistory {
    pub entries: Vec<HistoryEntry>,
    /// Total rows in the window, for pagination.
    pub total: u64,
}

/// Request-scoped read-only reporting over the record store.
pub struct ContinuityReporter<'a, S, C> {
    store: &'a S,
    clock: &'a C,
    config: ContinuityConfig,
}

impl<'a, S: RecordStore, C: Clock> ContinuityReporter<'a, S, C> {
    pub fn new(store: &'a S, clock: &'a C, config: ContinuityConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Aggregates reusable candidates for a patient into a recommendation
    /// list.
    ///
    /// With a `template_id`, recent assessments of that template are
    /// included. With `metric_ids`, the targeted reuse lookup runs for
    /// exactly those metrics; without them, the observation category falls
    /// back to a broad recent-activity view (all observations in the
    /// validity window, newest first, capped).
    ///
    /// Recommendation rules are evaluated independently: reusable
    /// assessments yield a high-priority `assessment_reuse` entry, reusable
    /// observations a medium-priority `observation_reuse` entry, and when
    /// neither category has candidates a single low-priority `new_baseline`
    /// entry is produced.
    pub async fn get_continuity_suggestions(
        &self,
        patient_id: Uuid,
        template_id: Option<&str>,
        metric_ids: Option<&[String]>,
    ) -> ContinuitySuggestions {
        let resolver = ReuseResolver::new(self.store, self.clock);
        let validity_hours = self.config.validity_hours();
        let mut partial = false;

        let reusable_assessments = match template_id {
            Some(template_id) => {
                match resolver
                    .find_reusable_assessments(patient_id, template_id, validity_hours)
                    .await
                {
                    Ok(found) => found,
                    Err(error) => {
                        tracing::warn!(
                            %patient_id,
                            template_id,
                            %error,
                            "assessment suggestions degraded; omitting category"
                        );
                        partial = true;
                        Vec::new()
                    }
                }
            }
            None => Vec::new(),
        };

        let reusable_observations = match self
            .observation_candidates(&resolver, patient_id, metric_ids, validity_hours)
            .await
        {
            Ok(found) => found,
            Err(error) => {
                tracing::warn!(
                    %patient_id,
                    %error,
                    "observation suggestions degraded; omitting category"
                );
                partial = true;
                Vec::new()
            }
        };

        let mut recommendations = Vec::new();
        if !reusable_assessments.is_empty() {
            recommendations.push(Recommendation {
                kind: RecommendationKind::AssessmentReuse,
                priority: RecommendationPriority::High,
                message: format!(
                    "{} recent assessment(s) can be reused",
                    reusable_assessments.len()
                ),
            });
        }
        if !reusable_observations.is_empty() {
            recommendations.push(Recommendation {
                kind: RecommendationKind::ObservationReuse,
                priority: RecommendationPriority::Medium,
                message: format!(
                    "{} recent observation(s) can be reused",
                    reusable_observations.len()
                ),
            });
        }
        if reusable_assessments.is_empty() && reusable_observations.is_empty() {
            recommendations.push(Recommendation {
                kind: RecommendationKind::NewBaseline,
                priority: RecommendationPriority::Low,
                message: "no recent reusable data; collect a new baseline".into(),
            });
        }

        ContinuitySuggestions {
            reusable_assessments,
            reusable_observations,
            recommendations,
            partial,
        }
    }

    async fn observation_candidates(
        &self,
        resolver: &ReuseResolver<'a, S, C>,
        patient_id: Uuid,
        metric_ids: Option<&[String]>,
        validity_hours: i64,
    ) -> ContinuityResult<Vec<MetricObservation>> {
        match metric_ids {
            Some(metric_ids) => {
                let selected = resolver
                    .find_reusable_observations(patient_id, metric_ids, validity_hours)
                    .await?;
                Ok(selected.into_values().collect())
            }
            None => {
                // Broad recent-activity view: unfiltered by the reuse
                // policy, newest first, capped.
                let filter = ObservationFilter {
                    patient_id: Some(patient_id),
                    metric_ids: None,
                    recorded_after: Some(
                        self.clock.now() - Duration::hours(validity_hours),
                    ),
                    source: None,
                    context: None,
                };
                let mut found = self.store.query_observations(&filter).await?;
                found.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
                found.truncate(self.config.suggestion_observation_limit());
                Ok(found)
            }
        }
    }

    /// Returns the patient's assessments from the history window, newest
    /// first, paginated, with template and clinician details joined in for
    /// presentation. A patient with no history gets an empty page, not an
    /// error; a template or clinician the store no longer knows leaves the
    /// joined fields unset.
    ///
    /// # Errors
    ///
    /// [`ContinuityError::Storage`](crate::error::ContinuityError::Storage)
    /// if any of the underlying queries fail.
    pub async fn get_continuity_history(
        &self,
        patient_id: Uuid,
        page: Page,
    ) -> ContinuityResult<ContinuityHistory> {
        let cutoff = self.clock.now() - Duration::days(self.config.history_window_days());
        let filter = AssessmentFilter {
            patient_id: Some(patient_id),
            template_id: None,
            completed_after: Some(cutoff),
        };

        let total = self.store.count_assessments(&filter).await?;
        let records = self
            .store
            .query_assessments(&filter, AssessmentOrder::CompletedDesc, Some(page))
            .await?;

        let mut template_cache: HashMap<String, Option<(String, Option<String>)>> =
            HashMap::new();
        let mut clinician_cache: HashMap<Uuid, Option<String>> = HashMap::new();

        let mut entries = Vec::with_capacity(records.len());
        for assessment in records {
            let template = match template_cache.get(&assessment.template_id) {
                Some(cached) => cached.clone(),
                None => {
                    let fetched = self
                        .store
                        .get_template(&assessment.template_id)
                        .await?
                        .map(|t| (t.name, t.category));
                    template_cache.insert(assessment.template_id.clone(), fetched.clone());
                    fetched
                }
            };

            let clinician_name = match assessment.clinician_id {
                Some(clinician_id) => match clinician_cache.get(&clinician_id) {
                    Some(cached) => cached.clone(),
                    None => {
                        let fetched = self
                            .store
                            .get_clinician(clinician_id)
                            .await?
                            .map(|c| c.display_name);
                        clinician_cache.insert(clinician_id, fetched.clone());
                        fetched
                    }
                },
                None => None,
            };

            let (template_name, template_category) = match template {
                Some((name, category)) => (Some(name), category),
                None => (None, None),
            };

            entries.push(HistoryEntry {
                assessment,
                template_name,
                template_category,
                clinician_name,
            });
        }

        Ok(ContinuityHistory { entries, total })
    }
}

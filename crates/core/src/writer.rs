//! The continuity write path.
//!
//! Every creation request goes through a short decision ladder before
//! anything is written: can a whole recent assessment stand in, can recent
//! monitored observations be assembled into one, or is a genuinely new
//! record needed. Reuse never returns a pointer to an old row — each branch
//! persists a fresh record so every clinical encounter has its own
//! auditable entry.

use crate::clock::Clock;
use crate::config::ContinuityConfig;
use crate::error::{ContinuityError, ContinuityResult};
use crate::model::{
    AssessmentOptions, ContinuityDecision, NewAssessmentRequest, NewObservationRequest,
    ObservationOutcome, ReuseSource, Template,
};
use crate::resolver::ReuseResolver;
use crate::store::{AssessmentDraft, ObservationDraft, ObservationFilter, RecordStore};
use chrono::Duration;
use continuity_types::MetricValue;
use std::collections::BTreeMap;

/// Pluggable scoring over a (possibly partial) response set.
///
/// Scoring formulas are external to this engine. The result must be
/// deterministic for a given template and response set; `None` means the
/// responses do not admit a score.
pub trait AssessmentScorer: Send + Sync {
    fn score(&self, template: &Template, responses: &BTreeMap<String, MetricValue>) -> Option<f64>;
}

/// Averages the numeric responses; non-numeric responses are ignored.
///
/// A deliberately simple default for observation-synthesized assessments.
/// It is not claimed to be clinically meaningful for mixed-type templates;
/// deployments substitute their own scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanNumericScorer;

impl AssessmentScorer for MeanNumericScorer {
    fn score(&self, _template: &Template, responses: &BTreeMap<String, MetricValue>) -> Option<f64> {
        let numeric: Vec<f64> = responses
            .values()
            .filter_map(MetricValue::as_numeric)
            .collect();
        if numeric.is_empty() {
            return None;
        }
        Some(numeric.iter().sum::<f64>() / numeric.len() as f64)
    }
}

/// Request-scoped writer applying the continuity policy.
pub struct ContinuityWriter<'a, S, C, R> {
    store: &'a S,
    clock: &'a C,
    scorer: &'a R,
    config: ContinuityConfig,
}

impl<'a, S: RecordStore, C: Clock, R: AssessmentScorer> ContinuityWriter<'a, S, C, R> {
    pub fn new(store: &'a S, clock: &'a C, scorer: &'a R, config: ContinuityConfig) -> Self {
        Self {
            store,
            clock,
            scorer,
            config,
        }
    }

    /// Creates an assessment, reusing recent data where the policy allows.
    ///
    /// Decision order, stopping at the first branch that applies:
    ///
    /// 1. unless `force_new`, a recent completed assessment of the same
    ///    template: its responses and score are copied verbatim into a new
    ///    record stamped with the current time;
    /// 2. unless `force_new`, reusable observations covering at least one of
    ///    the template's required metrics: a new record is synthesized from
    ///    them and scored over the partial response set;
    /// 3. otherwise a new record with empty responses and no score.
    ///
    /// A new [`AssessmentRecord`](crate::model::AssessmentRecord) is
    /// persisted in every branch.
    ///
    /// # Errors
    ///
    /// [`ContinuityError::TemplateNotFound`] when the observation-reuse
    /// branch cannot load the template, [`ContinuityError::Storage`] on any
    /// store failure (never retried here), [`ContinuityError::Precondition`]
    /// for a non-positive validity override.
    pub async fn create_assessment_with_continuity(
        &self,
        request: &NewAssessmentRequest,
        options: &AssessmentOptions,
    ) -> ContinuityResult<ContinuityDecision> {
        let validity_hours = options
            .validity_hours
            .unwrap_or_else(|| self.config.validity_hours());
        let resolver = ReuseResolver::new(self.store, self.clock);

        if !request.force_new && options.allow_assessment_reuse {
            let candidates = resolver
                .find_reusable_assessments(request.patient_id, &request.template_id, validity_hours)
                .await?;
            if let Some(source) = candidates.first() {
                return self.reuse_assessment(request, source).await;
            }
        }

        if !request.force_new && options.allow_observation_reuse {
            let template = self
                .store
                .get_template(&request.template_id)
                .await?
                .ok_or_else(|| ContinuityError::TemplateNotFound(request.template_id.clone()))?;
            let required = template.required_metric_ids();
            let matched = resolver
                .find_reusable_observations(request.patient_id, &required, validity_hours)
                .await?;
            if !matched.is_empty() {
                return self.synthesize_from_observations(request, &template, matched).await;
            }
        }

        self.create_baseline(request).await
    }

    async fn reuse_assessment(
        &self,
        request: &NewAssessmentRequest,
        source: &crate::model::AssessmentRecord,
    ) -> ContinuityResult<ContinuityDecision> {
        let record = self
            .store
            .insert_assessment(AssessmentDraft {
                patient_id: request.patient_id,
                template_id: request.template_id.clone(),
                responses: source.responses.clone(),
                score: source.score,
                completed_at: self.clock.now(),
                clinician_id: request.clinician_id,
                notes: Some(format!("reused from assessment {}", source.id)),
            })
            .await?;

        tracing::debug!(
            patient_id = %request.patient_id,
            template_id = %request.template_id,
            source_id = %source.id,
            "assessment created by reusing a recent assessment"
        );

        Ok(ContinuityDecision {
            record,
            continuity_used: true,
            source: ReuseSource::Assessment {
                source_id: source.id,
            },
            message: format!(
                "responses carried forward from assessment {} completed at {}",
                source.id, source.completed_at
            ),
        })
    }

    async fn synthesize_from_observations(
        &self,
        request: &NewAssessmentRequest,
        template: &Template,
        matched: BTreeMap<String, crate::model::MetricObservation>,
    ) -> ContinuityResult<ContinuityDecision> {
        let mut responses = BTreeMap::new();
        let mut source_ids = Vec::with_capacity(matched.len());
        for (metric_id, observation) in &matched {
            // Responses are keyed by the template's metric key; fall back to
            // the metric id for items the template no longer declares.
            let key = template
                .metric_key_for(metric_id)
                .unwrap_or(metric_id.as_str());
            responses.insert(key.to_owned(), observation.value.clone());
            source_ids.push(observation.id);
        }

        let score = self.scorer.score(template, &responses);
        let record = self
            .store
            .insert_assessment(AssessmentDraft {
                patient_id: request.patient_id,
                template_id: request.template_id.clone(),
                responses,
                score,
                completed_at: self.clock.now(),
                clinician_id: request.clinician_id,
                notes: Some(format!(
                    "synthesized from {} recent observation(s)",
                    source_ids.len()
                )),
            })
            .await?;

        tracing::debug!(
            patient_id = %request.patient_id,
            template_id = %request.template_id,
            observations = source_ids.len(),
            "assessment synthesized from reusable observations"
        );

        Ok(ContinuityDecision {
            record,
            continuity_used: true,
            source: ReuseSource::Observations { source_ids },
            message: format!(
                "responses synthesized from {} recent observation(s)",
                matched.len()
            ),
        })
    }

    async fn create_baseline(
        &self,
        request: &NewAssessmentRequest,
    ) -> ContinuityResult<ContinuityDecision> {
        let record = self
            .store
            .insert_assessment(AssessmentDraft {
                patient_id: request.patient_id,
                template_id: request.template_id.clone(),
                responses: BTreeMap::new(),
                score: None,
                completed_at: self.clock.now(),
                clinician_id: request.clinician_id,
                notes: Some("no reusable data within the validity window".into()),
            })
            .await?;

        Ok(ContinuityDecision {
            record,
            continuity_used: false,
            source: ReuseSource::None,
            message: "no reusable data existed; a new baseline assessment was created".into(),
        })
    }

    /// Records an observation, deduplicating against the most recent one.
    ///
    /// The single most recent observation for `(patient, metric)` within the
    /// dedup window is fetched; if its value is deep-equal to the incoming
    /// one, no row is written and the existing observation is returned with
    /// `continuity_used: true`. Equality considers the value only — source,
    /// context, and notes do not affect duplicate detection.
    ///
    /// This is a best-effort read-then-write check, not a transactional
    /// constraint: two concurrent identical submissions can both pass it and
    /// both insert. Closing that race is a storage-backend concern
    /// (uniqueness constraint); the window length and value-only comparison
    /// are fixed semantics.
    ///
    /// # Errors
    ///
    /// [`ContinuityError::Storage`] if the lookup or insert fails.
    pub async fn create_observation_with_context(
        &self,
        request: NewObservationRequest,
    ) -> ContinuityResult<ObservationOutcome> {
        let cutoff = self.clock.now() - Duration::hours(self.config.dedup_window_hours());
        let filter = ObservationFilter {
            patient_id: Some(request.patient_id),
            metric_ids: Some(vec![request.metric_id.clone()]),
            recorded_after: Some(cutoff),
            source: None,
            context: None,
        };
        let recent = self.store.query_observations(&filter).await?;
        let most_recent = recent.into_iter().max_by_key(|obs| obs.recorded_at);

        if let Some(existing) = most_recent {
            if existing.value == request.value {
                tracing::debug!(
                    patient_id = %request.patient_id,
                    metric_id = %request.metric_id,
                    existing_id = %existing.id,
                    "duplicate observation suppressed"
                );
                return Ok(ObservationOutcome {
                    observation: existing,
                    continuity_used: true,
                });
            }
        }

        let observation = self
            .store
            .insert_observation(ObservationDraft {
                patient_id: request.patient_id,
                metric_id: request.metric_id,
                value: request.value,
                source: request.source,
                context: request.context,
                recorded_at: self.clock.now(),
                clinician_id: request.clinician_id,
                enrollment_id: request.enrollment_id,
                organization_id: request.organization_id,
                notes: request.notes,
            })
            .await?;

        Ok(ObservationOutcome {
            observation,
            continuity_used: false,
        })
    }
}

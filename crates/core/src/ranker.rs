//! Relevance ranking for observation candidates.
//!
//! When several observations of the same metric qualify for reuse, exactly
//! one must represent the patient's current state. Clinical context decides
//! first (monitored data beats a fresher wellness self-report), recency
//! breaks ties. The comparator is stable under input permutation: list order
//! never influences the winner.

use crate::model::MetricObservation;

/// Selects the single most relevant observation from `candidates`.
///
/// Fold keeping the current best: a contender replaces it on a strictly
/// better (lower) context priority rank, or on an equal rank with a strictly
/// later `recorded_at`. When two candidates tie exactly on both rank and
/// timestamp, which of them wins is implementation-defined (the incumbent is
/// kept), but the result is always one of the tied candidates.
///
/// All candidates are expected to share a patient and metric; this function
/// does not check that.
///
/// # Panics
///
/// Panics if `candidates` is empty. An empty candidate set is a caller
/// contract violation, not a runtime condition to recover from.
pub fn most_relevant(candidates: &[MetricObservation]) -> &MetricObservation {
    let (first, rest) = candidates
        .split_first()
        .expect("most_relevant requires at least one candidate");

    rest.iter().fold(first, |best, contender| {
        let best_rank = best.context.priority_rank();
        let contender_rank = contender.context.priority_rank();
        if contender_rank < best_rank
            || (contender_rank == best_rank && contender.recorded_at > best.recorded_at)
        {
            contender
        } else {
            best
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ObservationContext, ObservationSource};
    use chrono::{DateTime, Duration, Utc};
    use continuity_types::MetricValue;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        "2026-03-01T12:00:00Z".parse().unwrap()
    }

    fn candidate(context: ObservationContext, recorded_at: DateTime<Utc>) -> MetricObservation {
        MetricObservation {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            metric_id: "pain".into(),
            value: MetricValue::Numeric(5.0),
            source: ObservationSource::Manual,
            context,
            recorded_at,
            clinician_id: None,
            enrollment_id: None,
            organization_id: None,
            notes: None,
        }
    }

    #[test]
    fn test_priority_beats_recency() {
        let monitored = candidate(
            ObservationContext::ClinicalMonitoring,
            now() - Duration::days(6),
        );
        let wellness = candidate(ObservationContext::Wellness, now() - Duration::hours(1));

        let candidates = [wellness.clone(), monitored.clone()];
        let picked = most_relevant(&candidates);
        assert_eq!(picked.id, monitored.id);
    }

    #[test]
    fn test_recency_breaks_priority_ties() {
        let older = candidate(
            ObservationContext::RoutineFollowup,
            now() - Duration::hours(5),
        );
        let newer = candidate(
            ObservationContext::RoutineFollowup,
            now() - Duration::hours(2),
        );

        let candidates = [older.clone(), newer.clone()];
        let picked = most_relevant(&candidates);
        assert_eq!(picked.id, newer.id);
    }

    #[test]
    fn test_deterministic_under_permutation() {
        let a = candidate(ObservationContext::Wellness, now() - Duration::hours(3));
        let b = candidate(
            ObservationContext::ProgramEnrollment,
            now() - Duration::days(2),
        );
        let c = candidate(ObservationContext::Unclassified, now());
        let d = candidate(
            ObservationContext::ProgramEnrollment,
            now() - Duration::days(1),
        );

        let orders = [
            vec![a.clone(), b.clone(), c.clone(), d.clone()],
            vec![d.clone(), c.clone(), b.clone(), a.clone()],
            vec![c.clone(), a.clone(), d.clone(), b.clone()],
        ];

        for order in &orders {
            // d: best rank present (2) with the later timestamp.
            assert_eq!(most_relevant(order).id, d.id);
        }
    }

    #[test]
    fn test_exact_tie_returns_one_of_the_tied_candidates() {
        // Identical (priority, recorded_at): the winner is
        // implementation-defined but must be one of the tied pair.
        let t = now();
        let first = candidate(ObservationContext::Wellness, t);
        let second = candidate(ObservationContext::Wellness, t);

        let candidates = [first.clone(), second.clone()];
        let picked = most_relevant(&candidates);
        assert!(picked.id == first.id || picked.id == second.id);
    }

    #[test]
    fn test_single_candidate_is_returned() {
        let only = candidate(ObservationContext::Unclassified, now());
        assert_eq!(most_relevant(&[only.clone()]).id, only.id);
    }

    #[test]
    #[should_panic(expected = "at least one candidate")]
    fn test_empty_candidates_panic() {
        most_relevant(&[]);
    }
}

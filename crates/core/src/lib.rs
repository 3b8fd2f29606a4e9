//! # Continuity Core
//!
//! The continuity and deduplication engine for clinical data points: given a
//! patient and a requested set of metric observations or a whole assessment,
//! it decides whether recent data can legitimately be reused instead of
//! forcing a new clinical encounter, and which existing record is the best
//! candidate when several qualify.
//!
//! The engine is request-scoped and stateless between invocations. It owns
//! no storage: callers inject a [`store::RecordStore`] handle (and a
//! [`clock::Clock`]) into each service, and every operation runs its queries
//! at decision time.
//!
//! - [`ranker`] picks the single most relevant observation among candidates
//!   for one metric (context priority, then recency).
//! - [`resolver::ReuseResolver`] answers "what reusable data exists" per
//!   metric and per template.
//! - [`writer::ContinuityWriter`] applies the write-path policy: reuse a
//!   recent assessment, synthesize from observations, or create a genuinely
//!   new record, with a short-horizon idempotency check on observations.
//! - [`reporter::ContinuityReporter`] provides the read-only suggestion and
//!   history views.
//!
//! **No API concerns**: authentication, tenancy, HTTP surfaces, and
//! persistence engines live with the embedding application.

pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod model;
pub mod ranker;
pub mod reporter;
pub mod resolver;
pub mod store;
pub mod writer;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::ContinuityConfig;
pub use error::{ContinuityError, ContinuityResult, StorageError};
pub use model::{
    AssessmentOptions, AssessmentRecord, ClinicianRef, ContinuityDecision, MetricObservation,
    NewAssessmentRequest, NewObservationRequest, ObservationContext, ObservationOutcome,
    ObservationSource, ReuseSource, Template, TemplateItem,
};
pub use reporter::{ContinuityHistory, ContinuityReporter, ContinuitySuggestions, Recommendation};
pub use resolver::ReuseResolver;
pub use store::{memory::MemoryStore, Page, RecordStore};
pub use writer::{AssessmentScorer, ContinuityWriter, MeanNumericScorer};

pub use continuity_types::MetricValue;

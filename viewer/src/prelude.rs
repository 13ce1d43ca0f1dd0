// Everything a front end needs to drive a review.
pub use crate::navigation::{NavState, PlayOutcome};
pub use crate::record::{LineContext, MoveId, MoveRecord};
pub use crate::session::{
    spawn_review_session, PositionFacts, ReviewEvent, ReviewSnapshot, SessionHandle,
};
pub use crate::ReviewError;
pub use analysis::MoveClassification;
pub use analysis_client::AnalysisTransport;

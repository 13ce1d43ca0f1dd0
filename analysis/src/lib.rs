//! Pure move-quality and commentary helpers over already-analysed moves.

pub mod classify;
pub mod commentary;
pub mod features;
pub mod openings;

pub use classify::{classify_move, MoveClassification};
pub use commentary::{generate_commentary, CommentaryInput};
pub use features::{top_feature_deltas, FeatureDelta, FeatureTrace, FeatureValue, TOP_FEATURES};
pub use openings::{BookError, Opening, OpeningBook};

use super::snapshot::ReviewSnapshot;

/// Events broadcast from the review actor to all subscribers.
#[derive(Debug, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum ReviewEvent {
    /// Full state snapshot after any change.
    StateChanged(ReviewSnapshot),
    /// Transport or backend trouble, for status lines and logs.
    Error(String),
}

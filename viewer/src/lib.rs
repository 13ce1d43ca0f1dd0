//! Game review core: the mainline with its engine lines, a preview branch,
//! and the navigation state machine that keeps them consistent while
//! analysis streams in.

pub mod commentary;
pub mod converters;
mod error;
pub mod move_list;
pub mod move_tree;
pub mod navigation;
pub mod prelude;
pub mod record;
pub mod reveal;
pub mod session;

pub use error::ReviewError;
pub use move_list::{LineKind, MoveList, MoveListError, MoveSlot, PvPair, RecordLocation, UpdateOutcome};
pub use move_tree::{MoveTree, TreeNode};
pub use navigation::{NavState, Navigator, PlayOutcome, PreviewBranch, SessionPhase};
pub use record::{LineContext, MoveId, MoveRecord};
pub use reveal::RevealScheduler;
pub use session::{spawn_review_session, ReviewEvent, ReviewSnapshot, SessionHandle};

//! The review session: one actor task owning the navigator and the
//! transport, driven through a cloneable [`SessionHandle`].

mod actor;
pub mod commands;
pub mod events;
pub mod handle;
pub mod snapshot;

use analysis_client::AnalysisTransport;
use tokio::sync::{broadcast, mpsc};

use crate::navigation::Navigator;
use actor::run_review_actor;
pub use commands::ReviewCommand;
pub use events::ReviewEvent;
pub use handle::SessionHandle;
pub use snapshot::{PositionFacts, ReviewSnapshot};

const COMMAND_BUFFER: usize = 32;
const EVENT_BUFFER: usize = 100;

/// Spawn the actor for `nav` on the current runtime.
pub fn spawn_review_session<T>(nav: Navigator, transport: T) -> SessionHandle
where
    T: AnalysisTransport + 'static,
{
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
    let (event_tx, _) = broadcast::channel(EVENT_BUFFER);

    tokio::spawn(async move {
        run_review_actor(nav, transport, cmd_rx, event_tx).await;
    });

    SessionHandle::new(cmd_tx)
}

//! Typewriter-style reveal of commentary text.
//!
//! Each comment gets its own task that grows the visible text one character
//! per tick. A reveal can be finalized (show everything now) or cancelled
//! (stop where it is) at any time.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

struct Reveal {
    full: String,
    text: Arc<watch::Sender<String>>,
    task: JoinHandle<()>,
}

#[derive(Default)]
pub struct RevealScheduler {
    reveals: HashMap<String, Reveal>,
}

impl RevealScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start revealing `text` under `id`, replacing any reveal with the same
    /// id. The receiver always holds the currently visible prefix.
    pub fn start(
        &mut self,
        id: impl Into<String>,
        text: impl Into<String>,
        tick: Duration,
    ) -> watch::Receiver<String> {
        let id = id.into();
        let full = text.into();
        self.cancel(&id);

        let (tx, rx) = watch::channel(String::new());
        let tx = Arc::new(tx);
        let task = tokio::spawn(reveal_task(full.clone(), Arc::clone(&tx), tick));
        self.reveals.insert(
            id,
            Reveal {
                full,
                text: tx,
                task,
            },
        );
        rx
    }

    /// Show the whole text of `id` immediately. False if `id` is unknown.
    pub fn finalize(&mut self, id: &str) -> bool {
        match self.reveals.remove(id) {
            Some(reveal) => {
                reveal.task.abort();
                reveal.text.send_replace(reveal.full);
                true
            }
            None => false,
        }
    }

    /// Stop revealing `id`, leaving the visible text as it is.
    pub fn cancel(&mut self, id: &str) -> bool {
        match self.reveals.remove(id) {
            Some(reveal) => {
                reveal.task.abort();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, reveal) in self.reveals.drain() {
            reveal.task.abort();
        }
    }

    pub fn is_revealing(&self, id: &str) -> bool {
        self.reveals
            .get(id)
            .is_some_and(|reveal| !reveal.task.is_finished())
    }
}

impl Drop for RevealScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

async fn reveal_task(full: String, text: Arc<watch::Sender<String>>, tick: Duration) {
    let mut interval = time::interval(tick.max(Duration::from_millis(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    for (end, ch) in full.char_indices() {
        interval.tick().await;
        text.send_replace(full[..end + ch.len_utf8()].to_string());
    }
}

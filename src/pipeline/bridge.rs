//! Notification boundary between the pipeline and whoever renders it.
//!
//! Consumers subscribe and receive [`PipelineEvent`]s over a crossbeam
//! channel. Publishing never blocks the pipeline: channels are unbounded and
//! subscribers that dropped their receiver are pruned on the next publish.

use crate::pipeline::id::Generation;
use crate::pipeline::state::ViewState;
use crossbeam_channel::{unbounded, Receiver, Sender};

/// Messages sent from the pipeline to its subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// The view changed: new rows, new state, or both.
    StateChanged(ViewState),

    /// A snapshot replaced the row model.
    SnapshotApplied { generation: Generation, rows: usize },

    /// A snapshot arrived after a newer one was applied and was dropped.
    SnapshotDiscarded {
        generation: Generation,
        latest: Generation,
    },

    /// A fetch failed. The previous snapshot is still being served.
    FetchFailed {
        generation: Generation,
        message: String,
    },
}

/// Fan-out of pipeline events to any number of subscribers.
#[derive(Debug, Default)]
pub struct Subscribers {
    senders: Vec<Sender<PipelineEvent>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<PipelineEvent> {
        let (tx, rx) = unbounded();
        self.senders.push(tx);
        rx
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }

    pub fn publish(&mut self, event: PipelineEvent) {
        if self.senders.is_empty() {
            return;
        }
        let before = self.senders.len();
        self.senders.retain(|tx| tx.send(event.clone()).is_ok());
        let dropped = before - self.senders.len();
        if dropped > 0 {
            tracing::debug!("Pruned {} disconnected subscriber(s)", dropped);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_reaches_all_subscribers() {
        let mut subs = Subscribers::new();
        let a = subs.subscribe();
        let b = subs.subscribe();

        let event = PipelineEvent::SnapshotApplied {
            generation: Generation(1),
            rows: 3,
        };
        subs.publish(event.clone());

        assert_eq!(a.try_recv().unwrap(), event);
        assert_eq!(b.try_recv().unwrap(), event);
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let mut subs = Subscribers::new();
        let kept = subs.subscribe();
        drop(subs.subscribe());
        assert_eq!(subs.len(), 2);

        subs.publish(PipelineEvent::FetchFailed {
            generation: Generation(2),
            message: "timeout".to_string(),
        });

        assert_eq!(subs.len(), 1);
        assert!(kept.try_recv().is_ok());
    }
}

use hoptrace_model::Topology;
use std::sync::mpsc::{self, Receiver, Sender};

/// What a session tells its presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    TopologyUpdated(Topology),
    Cleared,
    /// Whether a "stop" control should be shown.
    StopToggle(bool),
}

#[derive(Debug, Default)]
pub(crate) struct Subscribers {
    senders: Vec<Sender<Notification>>,
}

impl Subscribers {
    pub(crate) fn subscribe(&mut self) -> Receiver<Notification> {
        let (tx, rx) = mpsc::channel();
        self.senders.push(tx);
        rx
    }

    /// Delivers to every live subscriber and forgets the dropped ones.
    pub(crate) fn emit(&mut self, notification: Notification) {
        self.senders
            .retain(|sender| sender.send(notification.clone()).is_ok());
    }

    pub(crate) fn len(&self) -> usize {
        self.senders.len()
    }

    pub(crate) fn clear(&mut self) {
        self.senders.clear();
    }
}

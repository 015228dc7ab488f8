//! In-memory connector for tests.
//!
//! Records every activation, subscribe and deactivate call and hands the
//! event sink back so tests can play the client's side.

use std::cell::RefCell;
use std::rc::Rc;

use super::{ClientConfig, Connector, EventSink, SessionHandle};
use crate::session::SessionId;

/// What the fake client observed.
#[derive(Debug, Default)]
pub struct Recorded {
    /// Config and sink of every activation, oldest first.
    pub activations: Vec<(ClientConfig, EventSink)>,
    /// `(session, destination)` per subscribe call.
    pub subscribed: Vec<(SessionId, String)>,
    /// Sessions that were deactivated.
    pub deactivated: Vec<SessionId>,
}

/// Connector whose sessions only record calls.
#[derive(Debug, Default, Clone)]
pub struct FakeConnector {
    /// Shared call record.
    pub recorded: Rc<RefCell<Recorded>>,
}

impl FakeConnector {
    /// Sink handed to the most recent activation.
    pub fn last_sink(&self) -> EventSink {
        self.recorded
            .borrow()
            .activations
            .last()
            .map(|(_, sink)| sink.clone())
            .expect("no activation")
    }

    /// Number of activations so far.
    pub fn activation_count(&self) -> usize {
        self.recorded.borrow().activations.len()
    }
}

/// Handle returned by [`FakeConnector`].
#[derive(Debug)]
pub struct FakeHandle {
    id: SessionId,
    recorded: Rc<RefCell<Recorded>>,
}

impl Connector for FakeConnector {
    type Handle = FakeHandle;

    fn activate(&self, config: ClientConfig, events: EventSink) -> FakeHandle {
        let id = events.session();
        self.recorded.borrow_mut().activations.push((config, events));
        FakeHandle {
            id,
            recorded: Rc::clone(&self.recorded),
        }
    }
}

impl SessionHandle for FakeHandle {
    fn subscribe(&mut self, destination: &str) {
        self.recorded
            .borrow_mut()
            .subscribed
            .push((self.id, destination.to_string()));
    }

    fn deactivate(self) {
        self.recorded.borrow_mut().deactivated.push(self.id);
    }
}

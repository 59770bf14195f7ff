//! The capture session flow: the logic for communication between the host
//! application, the UIDAI-certified RD service that performs the biometric
//! capture, and the banking backend that consumes the encrypted PID block.
//!
//! The flow enforces a strict single-flight discipline: at most one capture
//! session is awaiting its callback at any time, held in a single pending
//! slot. Every accepted session produces exactly one terminal
//! [`primitives_pid::CaptureResult`], delivered once to the original caller
//! and once to the passive event stream.

#![warn(
    missing_docs,
    clippy::missing_docs_in_private_items,
    clippy::clone_on_ref_ptr
)]

use std::sync::Arc;

use rdservice_intent::{ActionResolver, IntentDispatcher};
use tokio::sync::{broadcast, Mutex};

mod error;
mod event;
mod flow;
mod sequence;
mod session;

pub use error::{DeviceInfoError, StartCaptureError};
pub use event::CaptureEvent;

/// How many undelivered events the passive stream buffers per subscriber.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// The capture session manager.
///
/// Owns the single-flight pending-session slot and mediates all traffic
/// between the UI-facing API and the external RD service processes.
pub struct CaptureFlow {
    /// The mutex over the mutable portion of the flow. Operations that
    /// touch the pending slots or the device cache run under this lock.
    locked: Mutex<session::Locked>,
    /// Host capability for activity resolution queries.
    resolver: Arc<dyn ActionResolver>,
    /// Host capability for intent delivery.
    dispatcher: Arc<dyn IntentDispatcher>,
    /// The passive event fan-out.
    events: broadcast::Sender<CaptureEvent>,
}

impl CaptureFlow {
    /// Create a flow on top of the host capabilities.
    pub fn new(
        resolver: Arc<dyn ActionResolver>,
        dispatcher: Arc<dyn IntentDispatcher>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            locked: Mutex::new(session::Locked::default()),
            resolver,
            dispatcher,
            events,
        })
    }

    /// Subscribe to the passive event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<CaptureEvent> {
        self.events.subscribe()
    }
}

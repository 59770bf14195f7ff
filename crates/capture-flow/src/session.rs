//! The mutable flow state.

use primitives_pid::{CaptureResult, Modality, RdDeviceInfo};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::sequence::Sequence;

/// The inner state, hidden behind the flow mutex to ensure nothing touches
/// it without holding the lock.
#[derive(Debug, Default)]
pub(crate) struct Locked {
    /// The correlation token source, shared by capture and info dispatches.
    pub(crate) sequence: Sequence,
    /// The single pending capture session. At most one capture may await its
    /// callback at a time; this slot is the whole single-flight discipline.
    /// There is no queue.
    pub(crate) pending: Option<Session>,
    /// The outstanding device info request, if any. Last dispatch wins.
    pub(crate) pending_info: Option<InfoRequest>,
    /// The most recent device observation. Overwritten on every new one,
    /// never evicted.
    pub(crate) device_info: Option<RdDeviceInfo>,
}

/// One in-flight capture session.
///
/// Created on dispatch; taken out of the pending slot by exactly one of a
/// matching callback, a cancel, or the watchdog. The taker produces the
/// session's single terminal result.
#[derive(Debug)]
pub(crate) struct Session {
    /// The correlation token the callback must echo.
    pub(crate) token: u64,
    /// The modality this session captures.
    pub(crate) modality: Modality,
    /// The completion handle awaited by the original caller.
    pub(crate) completion: oneshot::Sender<CaptureResult>,
    /// The timeout watchdog task, disarmed on every terminal transition.
    pub(crate) watchdog: JoinHandle<()>,
    /// When the session was dispatched.
    pub(crate) started_at: Instant,
}

/// One in-flight device info request.
#[derive(Debug, Clone, Copy)]
pub(crate) struct InfoRequest {
    /// The correlation token the reply must echo.
    pub(crate) token: u64,
    /// The modality the info was requested for.
    pub(crate) modality: Modality,
}

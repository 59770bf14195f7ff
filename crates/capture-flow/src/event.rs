//! The passive event stream.

use primitives_pid::{CaptureResult, RdDeviceInfo};

/// Events fanned out to passive subscribers.
///
/// Terminal capture outcomes are delivered here with content identical to
/// the value the original caller receives. There is one canonical result
/// and two delivery channels, not two computations.
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// A fresh device observation was cached.
    DeviceConnected(RdDeviceInfo),
    /// A capture session reached its terminal outcome.
    CaptureComplete(CaptureResult),
}

//! The capture flow error conditions.

use primitives_pid::Modality;
use rdservice_intent::DispatchError;
use thiserror::Error;

/// The errors `start_capture` can fail with before a session is accepted.
///
/// Once a session is accepted, every outcome (including timeout and
/// cancellation) is reported through the terminal
/// [`primitives_pid::CaptureResult`] instead.
#[derive(Debug, Error)]
pub enum StartCaptureError {
    /// A capture session is already awaiting its callback. The running
    /// session is not disturbed; retry once it completes.
    #[error("a capture session is already running")]
    CaptureInProgress,
    /// No foreground execution context exists to receive the asynchronous
    /// callback. Transient; depends on the host UI state.
    #[error("no foreground context to receive the RD service callback")]
    NoActiveContext,
    /// No installed application answers the capture action for the
    /// requested modality.
    #[error("no RD service found for modality {modality}; install a UIDAI-certified provider (e.g. Morpho or Mantra RD Service)")]
    ProviderNotFound {
        /// The modality no provider was found for.
        modality: Modality,
    },
    /// The host failed to deliver the capture intent.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    /// The flow was torn down before the session produced its result.
    #[error("the capture session was dropped before completing")]
    SessionDropped,
}

/// The errors a device info request can fail with.
#[derive(Debug, Error)]
pub enum DeviceInfoError {
    /// No foreground execution context exists to receive the reply.
    #[error("no foreground context to receive the RD service callback")]
    NoActiveContext,
    /// No installed application answers the info action for the modality.
    #[error("no RD service found for modality {modality}")]
    ProviderNotFound {
        /// The modality no provider was found for.
        modality: Modality,
    },
    /// The host failed to deliver the info intent.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

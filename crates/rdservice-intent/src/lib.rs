//! The host intent boundary for RD service communication.
//!
//! RD services are separate processes driven through host-delivered intents;
//! this crate holds the types that cross that boundary and the capability
//! traits the host adapter implements. The host-OS specifics (activity
//! resolution flags across OS versions, the actual delivery mechanism) stay
//! on the adapter side of these traits.

#![warn(
    missing_docs,
    clippy::missing_docs_in_private_items,
    clippy::clone_on_ref_ptr
)]

use thiserror::Error;

pub mod actions;
mod extras;

pub use extras::Extras;

/// The host result code for a completed request.
pub const RESULT_OK: i32 = -1;
/// The host result code for a cancelled request.
pub const RESULT_CANCELED: i32 = 0;
/// The first user-defined host result code. Some face RD services report
/// success with this code instead of [`RESULT_OK`].
pub const RESULT_FIRST_USER: i32 = 1;

/// A request to be delivered to an external RD service process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundIntent {
    /// The UIDAI action string the receiving application must declare.
    pub action: &'static str,
    /// An explicit target package, when the caller pinned a provider.
    /// `None` lets the host pick any application answering the action.
    pub target_package: Option<String>,
    /// The extras to attach; for capture this carries the PID options XML.
    pub extras: Extras,
    /// The correlation token echoed back with the asynchronous response.
    pub token: u64,
}

/// The asynchronous response the host delivers for a dispatched intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentResponse {
    /// The host result code.
    pub code: i32,
    /// The extras the external process attached to its reply.
    pub extras: Extras,
}

impl IntentResponse {
    /// Whether the result code indicates transport-level success.
    ///
    /// [`RESULT_FIRST_USER`] is accepted alongside [`RESULT_OK`] because
    /// AadhaarFaceRD (and some other face services) report success with it.
    pub fn is_success(&self) -> bool {
        self.code == RESULT_OK || self.code == RESULT_FIRST_USER
    }
}

/// The error produced when an intent could not be handed to the host.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// There is no foreground execution context able to receive the
    /// asynchronous result callback.
    #[error("no foreground context to receive the RD service callback")]
    NoForegroundContext,
    /// The host rejected or failed the delivery itself.
    #[error("intent dispatch failed: {0}")]
    Failed(String),
}

/// Host capability: query whether an installed application answers an action.
///
/// A negative result is a valid, final answer; the query is idempotent and
/// side-effect free, so callers may repeat it freely.
pub trait ActionResolver: Send + Sync {
    /// Whether any installed application declares a handler for `action`.
    fn resolve_action(&self, action: &str) -> bool;

    /// Whether the specific `package` declares a handler for `action`.
    ///
    /// Info and capture availability differ per package: some vendor
    /// applications implement one action but not the other, so the two are
    /// always checked independently.
    fn resolve_package_action(&self, package: &str, action: &str) -> bool;

    /// The installed version of `package`, when the host knows it.
    fn package_version(&self, _package: &str) -> Option<String> {
        None
    }

    /// The human-readable label of `package`, when the host knows it.
    fn package_label(&self, _package: &str) -> Option<String> {
        None
    }
}

/// Host capability: deliver an intent to an external process.
pub trait IntentDispatcher: Send + Sync {
    /// Whether a foreground context capable of receiving result callbacks
    /// currently exists.
    fn foreground_ready(&self) -> bool;

    /// Hand the intent to the host for delivery.
    ///
    /// A successful dispatch only means the host accepted the request; the
    /// outcome arrives later as an [`IntentResponse`] correlated by token.
    fn dispatch(&self, intent: OutboundIntent) -> Result<(), DispatchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_and_first_user_codes_are_transport_success() {
        let mut response = IntentResponse {
            code: RESULT_OK,
            extras: Extras::new(),
        };
        assert!(response.is_success());

        response.code = RESULT_FIRST_USER;
        assert!(response.is_success());

        response.code = RESULT_CANCELED;
        assert!(!response.is_success());

        response.code = 2;
        assert!(!response.is_success());
    }
}

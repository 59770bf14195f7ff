//! Extras key names used by the RD service intent protocol.
//!
//! Vendors disagree on the key the same logical value travels under; each
//! logical field gets an explicit candidate list in priority order, and the
//! first non-empty match wins.

use primitives_pid::Modality;

/// The outbound extras key carrying the PID options XML.
///
/// The face capture action expects `request`; fingerprint and iris expect
/// `PID_OPTIONS`. The key must match the action or the vendor application
/// silently ignores the payload.
pub fn pid_options_key(modality: Modality) -> &'static str {
    match modality {
        Modality::Face => "request",
        Modality::Finger | Modality::Iris => "PID_OPTIONS",
    }
}

/// Candidate keys for the encrypted PID payload in a capture response.
pub const PID_DATA_KEYS: [&str; 2] = ["PID_DATA", "response"];

/// Candidate keys for the vendor error code in a failed response.
pub const ERR_CODE_KEYS: [&str; 3] = ["errCode", "ERROR_CODE", "error_code"];

/// Candidate keys for the vendor error text in a failed response.
pub const ERR_INFO_KEYS: [&str; 4] = ["errInfo", "ERROR_INFO", "error_info", "message"];

/// The extras key carrying the device info XML in an INFO reply.
pub const RD_SERVICE_INFO_KEY: &str = "RD_SERVICE_INFO";

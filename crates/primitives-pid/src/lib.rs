//! Plain data types for the UIDAI PID capture pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The biometric modality an RD service captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    /// Fingerprint capture.
    Finger,
    /// Iris capture.
    Iris,
    /// Face capture.
    Face,
}

impl Modality {
    /// The uppercase wire label, as exposed to the UI layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Finger => "FINGER",
            Self::Iris => "IRIS",
            Self::Face => "FACE",
        }
    }

    /// The single-letter code used in the UIDAI provider catalogs:
    /// `f` for finger, `i` for iris, `p` for photo (face).
    pub fn short_code(&self) -> char {
        match self {
            Self::Finger => 'f',
            Self::Iris => 'i',
            Self::Face => 'p',
        }
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The caller-supplied parameters for one capture session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureOptions {
    /// Which modality to capture.
    pub modality: Modality,
    /// Transaction purpose label, forwarded to the UI layer (`AEPS`, `DMT`,
    /// `EKYC`, ...).
    pub purpose: String,
    /// How many fingers/irises to capture in one session. Ignored for face.
    pub count: u8,
    /// Session timeout in seconds before the capture auto-cancels.
    pub timeout_secs: u32,
    /// Whether the RD service should show its native capture overlay.
    pub show_native_ui: bool,
    /// The backend-supplied WADH token. Mandatory for face authentication
    /// to succeed; empty means absent.
    pub wadh: String,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            modality: Modality::Finger,
            purpose: "AEPS".to_owned(),
            count: 1,
            timeout_secs: 60,
            show_native_ui: true,
            wadh: String::new(),
        }
    }
}

impl CaptureOptions {
    /// The requested count, clamped to the 1..=2 range the RD services accept.
    pub fn clamped_count(&self) -> u8 {
        self.count.clamp(1, 2)
    }

    /// The session timeout, converted to the milliseconds the wire expects.
    pub fn timeout_millis(&self) -> u64 {
        u64::from(self.timeout_secs) * 1000
    }
}

/// RD device metadata, as reported by the service via the INFO reply or
/// embedded in a capture response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RdDeviceInfo {
    /// Hardware serial number of the RD device.
    pub serial_number: String,
    /// Device model, e.g. "Mantra MFS100".
    pub device_model: String,
    /// UIDAI-assigned device provider id.
    pub device_id: String,
    /// Device certificate expiry date, `YYYY-MM-DD`.
    pub cert_expiry: String,
    /// The modality the device serves, as a wire label. Empty if unknown.
    pub modality: String,
    /// RD service version string.
    pub rd_service_version: String,
    /// Package identifier of the RD service application.
    pub rd_service_package: String,
}

impl RdDeviceInfo {
    /// Whether the device certificate expiry lies strictly after `today`.
    ///
    /// An absent or unparseable expiry date counts as invalid.
    pub fn cert_valid_at(&self, today: NaiveDate) -> bool {
        if self.cert_expiry.is_empty() {
            return false;
        }
        match NaiveDate::parse_from_str(&self.cert_expiry, "%Y-%m-%d") {
            Ok(expiry) => expiry > today,
            Err(_) => false,
        }
    }
}

/// The encrypted PID block produced by a capture.
///
/// The `pid_data`, `hmac` and `session_key` fields are Base64 ciphertext and
/// stay opaque: they are forwarded to the banking backend unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PidBlock {
    /// Base64-encoded encrypted PID XML.
    pub pid_data: String,
    /// Base64 HMAC over the PID XML.
    pub hmac: String,
    /// Base64 session key, encrypted with the device certificate public key.
    pub session_key: String,
    /// RD service error code; `"0"` means success.
    pub error_code: String,
    /// Human-readable error description from the RD service.
    pub error_info: String,
    /// Capture timestamp, `YYYY-MM-DDTHH:MM:SS`.
    pub capture_timestamp: String,
    /// The modality that was captured, as a wire label.
    pub modality: String,
    /// Number of fingers/irises actually captured.
    pub captured_count: u32,
    /// Snapshot of the device info at capture time.
    pub device_info: RdDeviceInfo,
}

/// The error code RD services use to report a successful capture.
pub const SUCCESS_ERROR_CODE: &str = "0";

impl PidBlock {
    /// Whether the embedded RD service error code is the success sentinel.
    pub fn is_success(&self) -> bool {
        self.error_code == SUCCESS_ERROR_CODE
    }
}

/// The terminal outcome of a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CaptureStatus {
    /// The capture completed and the PID block carries the success sentinel.
    Success,
    /// The capture completed but produced no usable PID block, or the RD
    /// service reported an error code.
    Error,
    /// The session was cancelled, either locally or by the RD service.
    Cancelled,
    /// No callback arrived within the configured session timeout.
    Timeout,
}

/// The single canonical result shape all capture code paths converge to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureResult {
    /// The terminal status.
    pub status: CaptureStatus,
    /// The PID block; populated only when `status` is [`CaptureStatus::Success`].
    pub pid_block: Option<PidBlock>,
    /// Human-readable status message.
    pub message: String,
    /// Raw failure detail for support diagnosis; `None` on success.
    pub error: Option<String>,
}

impl CaptureResult {
    /// A successful capture carrying the PID block.
    pub fn success(pid_block: PidBlock, message: impl Into<String>) -> Self {
        Self {
            status: CaptureStatus::Success,
            pid_block: Some(pid_block),
            message: message.into(),
            error: None,
        }
    }

    /// A failed capture with a message and raw error detail.
    pub fn error(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status: CaptureStatus::Error,
            pid_block: None,
            message: message.into(),
            error: Some(error.into()),
        }
    }

    /// A cancelled capture.
    pub fn cancelled(message: impl Into<String>, error: Option<String>) -> Self {
        Self {
            status: CaptureStatus::Cancelled,
            pid_block: None,
            message: message.into(),
            error,
        }
    }

    /// A capture that ran out of time waiting for the RD service callback.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            status: CaptureStatus::Timeout,
            pid_block: None,
            message: message.into(),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_is_clamped_into_rd_service_range() {
        let mut options = CaptureOptions::default();

        options.count = 0;
        assert_eq!(options.clamped_count(), 1);

        options.count = 2;
        assert_eq!(options.clamped_count(), 2);

        options.count = 10;
        assert_eq!(options.clamped_count(), 2);
    }

    #[test]
    fn timeout_converts_to_milliseconds() {
        let options = CaptureOptions {
            timeout_secs: 10,
            ..Default::default()
        };
        assert_eq!(options.timeout_millis(), 10_000);
    }

    #[test]
    fn cert_validity_requires_a_parseable_future_date() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let mut info = RdDeviceInfo::default();
        assert!(!info.cert_valid_at(today));

        info.cert_expiry = "not-a-date".to_owned();
        assert!(!info.cert_valid_at(today));

        info.cert_expiry = "2024-05-31".to_owned();
        assert!(!info.cert_valid_at(today));

        info.cert_expiry = "2024-06-01".to_owned();
        assert!(!info.cert_valid_at(today));

        info.cert_expiry = "2026-01-01".to_owned();
        assert!(info.cert_valid_at(today));
    }

    #[test]
    fn status_serializes_to_uppercase_wire_labels() {
        assert_eq!(
            serde_json::to_value(CaptureStatus::Success).unwrap(),
            serde_json::json!("SUCCESS")
        );
        assert_eq!(
            serde_json::to_value(Modality::Face).unwrap(),
            serde_json::json!("FACE")
        );
    }

    #[test]
    fn capture_result_serializes_in_camel_case() {
        let result = CaptureResult::success(
            PidBlock {
                pid_data: "QUJD".to_owned(),
                ..Default::default()
            },
            "Biometric captured successfully",
        );

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["status"], "SUCCESS");
        assert_eq!(value["pidBlock"]["pidData"], "QUJD");
        assert_eq!(value["error"], serde_json::Value::Null);
    }
}

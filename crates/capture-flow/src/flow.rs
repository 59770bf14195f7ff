//! The state machine operations.

use std::sync::Arc;
use std::time::Duration;

use primitives_pid::{CaptureOptions, CaptureResult, Modality, RdDeviceInfo};
use rdservice_intent::{actions, Extras, IntentResponse, OutboundIntent};
use rdservice_protocol::{
    build_pid_options, keys, parse_device_info, parse_pid_response, ResponseContext,
};
use rdservice_registry::{Provider, PROVIDERS};
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{DeviceInfoError, StartCaptureError};
use crate::event::CaptureEvent;
use crate::session::{InfoRequest, Session};
use crate::CaptureFlow;

impl CaptureFlow {
    /// Whether any RD service application is installed at all, for any
    /// modality.
    pub fn discover_rd_service(&self) -> bool {
        actions::ALL_INFO_ACTIONS
            .iter()
            .any(|action| self.resolver.resolve_action(action))
    }

    /// The cataloged providers whose capture action actually resolves.
    ///
    /// Availability is checked against the capture action specifically:
    /// info availability does not imply capture availability, since some
    /// vendor applications implement only one of the two.
    pub fn discover_providers(&self, modality: Option<Modality>) -> Vec<&'static Provider> {
        PROVIDERS
            .iter()
            .filter(|provider| modality.map_or(true, |wanted| provider.modality == wanted))
            .filter(|provider| {
                self.resolver
                    .resolve_package_action(provider.package, provider.capture_action())
            })
            .collect()
    }

    /// Device records for every cataloged provider whose info action
    /// resolves, one record per installed RD service application.
    pub fn connected_devices(&self) -> Vec<RdDeviceInfo> {
        PROVIDERS
            .iter()
            .filter(|provider| {
                self.resolver
                    .resolve_package_action(provider.package, provider.info_action())
            })
            .map(|provider| RdDeviceInfo {
                device_model: self
                    .resolver
                    .package_label(provider.package)
                    .unwrap_or_else(|| provider.label.to_owned()),
                modality: provider.modality.as_str().to_owned(),
                rd_service_version: self
                    .resolver
                    .package_version(provider.package)
                    .unwrap_or_default(),
                rd_service_package: provider.package.to_owned(),
                ..Default::default()
            })
            .collect()
    }

    /// Start a capture session.
    ///
    /// At most one session may be awaiting its callback; a second request is
    /// rejected with [`StartCaptureError::CaptureInProgress`] and leaves the
    /// running session untouched. The returned future resolves with the
    /// terminal [`CaptureResult`] once the external process reports back,
    /// the session times out, or it is cancelled.
    pub async fn start_capture(
        self: &Arc<Self>,
        options: CaptureOptions,
    ) -> Result<CaptureResult, StartCaptureError> {
        let rx = self.dispatch_capture(options).await?;
        rx.await.map_err(|_| StartCaptureError::SessionDropped)
    }

    /// Validate the preconditions, dispatch the capture intent and arm the
    /// session. Everything runs under one lock acquisition so a callback can
    /// never observe a half-armed session.
    async fn dispatch_capture(
        self: &Arc<Self>,
        options: CaptureOptions,
    ) -> Result<oneshot::Receiver<CaptureResult>, StartCaptureError> {
        let modality = options.modality;
        let timeout_secs = options.timeout_secs;
        let mut locked = self.locked.lock().await;

        if locked.pending.is_some() {
            return Err(StartCaptureError::CaptureInProgress);
        }
        if !self.dispatcher.foreground_ready() {
            return Err(StartCaptureError::NoActiveContext);
        }

        // The action is a fixed per-modality lookup; face and iris use
        // distinct actions from the generic fingerprint one.
        let action = actions::capture_action(modality);
        if !self.resolver.resolve_action(action) {
            return Err(StartCaptureError::ProviderNotFound { modality });
        }

        let pid_options = build_pid_options(&options);
        debug!(message = "built PID options", %modality, xml = %pid_options);

        let token = locked.sequence.next();
        let mut extras = Extras::new();
        extras.insert(keys::pid_options_key(modality), pid_options);

        let timeout = Duration::from_millis(options.timeout_millis());
        let flow = Arc::clone(self);
        let watchdog = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            flow.expire(token, timeout_secs).await;
        });

        if let Err(error) = self.dispatcher.dispatch(OutboundIntent {
            action,
            target_package: None,
            extras,
            token,
        }) {
            watchdog.abort();
            return Err(error.into());
        }

        let (tx, rx) = oneshot::channel();
        locked.pending = Some(Session {
            token,
            modality,
            completion: tx,
            watchdog,
            started_at: Instant::now(),
        });

        info!(message = "capture session dispatched", %modality, token);
        Ok(rx)
    }

    /// Cancel the pending capture session. No-op when idle.
    ///
    /// Cancellation is cooperative: the external process may well keep
    /// capturing, but this process stops waiting and reports CANCELLED
    /// immediately.
    pub async fn cancel_capture(&self) {
        let session = self.locked.lock().await.pending.take();
        let Some(session) = session else {
            debug!("cancel requested with no capture session pending");
            return;
        };
        info!(message = "capture session cancelled", token = session.token);
        self.finish(
            session,
            CaptureResult::cancelled("Capture cancelled by user", None),
        );
    }

    /// The single transport callback entry.
    ///
    /// Routes by correlation token to the pending capture session or the
    /// outstanding info request. A response bearing any other token belongs
    /// to a completed, cancelled or timed-out request and is dropped.
    pub async fn handle_response(&self, token: u64, response: IntentResponse) {
        let (session, info_request) = {
            let mut locked = self.locked.lock().await;
            match &locked.pending {
                Some(session) if session.token == token => (locked.pending.take(), None),
                _ => match locked.pending_info {
                    Some(request) if request.token == token => {
                        locked.pending_info = None;
                        (None, Some(request))
                    }
                    _ => (None, None),
                },
            }
        };

        if let Some(session) = session {
            self.complete_capture(session, response).await;
        } else if let Some(request) = info_request {
            self.complete_info(request, response).await;
        } else {
            debug!(token, "response token matches no pending request, ignoring");
        }
    }

    /// Classify a correlated capture response and resolve the session.
    async fn complete_capture(&self, session: Session, response: IntentResponse) {
        let modality = session.modality;

        let result = if response.is_success() {
            self.decode_capture_payload(modality, &response).await
        } else {
            // Even on a cancelled transport code some services (face ones
            // especially) put error details into the extras; surface them.
            let err_code = response.extras.first_non_empty(&keys::ERR_CODE_KEYS);
            let err_info = response.extras.first_non_empty(&keys::ERR_INFO_KEYS);
            warn!(
                message = "capture rejected at the transport level",
                %modality,
                code = response.code,
                err_code = ?err_code,
                err_info = ?err_info,
            );

            let code = err_code.unwrap_or("unknown");
            let message = match err_info {
                Some(info) => format!("RD Service Error: {info} (code={code})"),
                None => format!(
                    "Capture cancelled or rejected by the RD service (code={})",
                    response.code
                ),
            };
            let info = err_info.unwrap_or("No error details returned by RD service");
            let detail = format!(
                "errCode={code} | {info} | extras: {}",
                response.extras.debug_dump()
            );
            CaptureResult::cancelled(message, Some(detail))
        };

        debug!(
            message = "capture session resolved",
            token = session.token,
            elapsed = ?session.started_at.elapsed(),
            status = ?result.status,
        );
        self.finish(session, result);
    }

    /// Decode the payload of a transport-successful capture response.
    async fn decode_capture_payload(
        &self,
        modality: Modality,
        response: &IntentResponse,
    ) -> CaptureResult {
        let err_code = response
            .extras
            .first_non_empty(&keys::ERR_CODE_KEYS)
            .unwrap_or("-1");
        let err_info = response
            .extras
            .first_non_empty(&keys::ERR_INFO_KEYS)
            .unwrap_or("Unknown error");

        // Vendors disagree on the payload key; when none of the known keys
        // hits, the first non-empty extra in iteration order is the best
        // remaining candidate for the XML.
        let payload = response
            .extras
            .first_non_empty(&keys::PID_DATA_KEYS)
            .or_else(|| response.extras.first_non_empty_value());

        let Some(payload) = payload else {
            return CaptureResult::error(
                err_info,
                format!("Empty PID data in RD service response (errCode={err_code})"),
            );
        };

        let block = parse_pid_response(
            payload,
            &ResponseContext {
                modality,
                transport_error_code: err_code,
                transport_error_info: err_info,
            },
        );

        self.cache_device_info(&block.device_info).await;

        if block.is_success() {
            CaptureResult::success(block, "Biometric captured successfully")
        } else {
            let message = block.error_info.clone();
            let detail = format!(
                "Device reported errCode={}: {}",
                block.error_code, block.error_info
            );
            CaptureResult::error(message, detail)
        }
    }

    /// Resolve the session as timed out, unless a callback won the race.
    async fn expire(&self, token: u64, timeout_secs: u32) {
        let session = {
            let mut locked = self.locked.lock().await;
            match &locked.pending {
                Some(session) if session.token == token => locked.pending.take(),
                _ => None,
            }
        };
        let Some(session) = session else { return };
        warn!(message = "capture session timed out", token, timeout_secs);
        self.finish(
            session,
            CaptureResult::timeout(format!(
                "Capture timed out after {timeout_secs}s waiting for the RD service"
            )),
        );
    }

    /// Resolve a taken session: disarm the watchdog and deliver the result
    /// to the caller and the event stream with identical content.
    fn finish(&self, session: Session, result: CaptureResult) {
        session.watchdog.abort();
        if session.completion.send(result.clone()).is_err() {
            debug!("capture caller went away before the result was delivered");
        }
        let _ = self.events.send(CaptureEvent::CaptureComplete(result));
    }

    /// Dispatch a device info request for the modality.
    ///
    /// Fire-and-forget: the reply arrives through [`Self::handle_response`],
    /// refreshes the device cache and emits
    /// [`CaptureEvent::DeviceConnected`].
    pub async fn request_device_info(&self, modality: Modality) -> Result<(), DeviceInfoError> {
        let mut locked = self.locked.lock().await;

        if !self.dispatcher.foreground_ready() {
            return Err(DeviceInfoError::NoActiveContext);
        }
        let action = actions::info_action(modality);
        if !self.resolver.resolve_action(action) {
            return Err(DeviceInfoError::ProviderNotFound { modality });
        }

        let token = locked.sequence.next();
        self.dispatcher.dispatch(OutboundIntent {
            action,
            target_package: None,
            extras: Extras::new(),
            token,
        })?;

        // Last dispatch wins; a reply to an overwritten request is ignored.
        locked.pending_info = Some(InfoRequest { token, modality });
        debug!(message = "device info request dispatched", %modality, token);
        Ok(())
    }

    /// Handle a correlated info reply.
    async fn complete_info(&self, request: InfoRequest, response: IntentResponse) {
        if !response.is_success() {
            debug!(
                message = "device info request failed at the transport level",
                code = response.code
            );
            return;
        }
        let Some(xml) = response
            .extras
            .first_non_empty(&[keys::RD_SERVICE_INFO_KEY])
        else {
            debug!("device info reply carried no RD_SERVICE_INFO payload");
            return;
        };

        let device = parse_device_info(xml, request.modality);
        info!(
            message = "device info observed",
            device_id = %device.device_id,
            version = %device.rd_service_version,
        );
        self.locked.lock().await.device_info = Some(device.clone());
        let _ = self.events.send(CaptureEvent::DeviceConnected(device));
    }

    /// Record a device observation when it carries any metadata. The cache
    /// is last-write-wins with no expiry.
    async fn cache_device_info(&self, device: &RdDeviceInfo) {
        let observed = !device.device_id.is_empty()
            || !device.serial_number.is_empty()
            || !device.rd_service_version.is_empty()
            || !device.cert_expiry.is_empty();
        if !observed {
            return;
        }
        self.locked.lock().await.device_info = Some(device.clone());
    }

    /// The most recent device observation, if any.
    pub async fn active_device(&self) -> Option<RdDeviceInfo> {
        self.locked.lock().await.device_info.clone()
    }

    /// Whether the cached device certificate expiry lies strictly after
    /// today. False when no device has been observed yet.
    pub async fn is_device_cert_valid(&self) -> bool {
        let device = self.locked.lock().await.device_info.clone();
        device.is_some_and(|device| device.cert_valid_at(chrono::Local::now().date_naive()))
    }

    /// The cached RD service version, if a device has been observed and
    /// reported one.
    pub async fn device_firmware_version(&self) -> Option<String> {
        self.locked
            .lock()
            .await
            .device_info
            .as_ref()
            .map(|device| device.rd_service_version.clone())
            .filter(|version| !version.is_empty())
    }
}

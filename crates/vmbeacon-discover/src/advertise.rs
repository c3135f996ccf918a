//! Advertising a debug session.

use std::sync::Arc;

use tracing::{debug, info, trace, warn};
use url::Url;

use crate::error::DiscoverError;
use crate::guard::{self, BotDetector, Eligibility, SuppressReason};
use crate::metadata::{local_hostname, Clock, DeviceMetadata, SystemClock, VersionProvider};
use crate::record::ObservationRecord;
use crate::transport::Transport;

/// Lifecycle of an [`Advertiser`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvertiserState {
    /// Nothing attempted yet.
    Idle,
    /// The eligibility guard declined.
    Suppressed(SuppressReason),
    /// A responder is answering queries for this app name.
    Advertising(String),
    /// Advertisement ended, failed, or had nothing to publish.
    Stopped,
}

/// What a call to [`Advertiser::advertise`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvertiseOutcome {
    /// The responder was started with this record.
    Advertising(ObservationRecord),
    /// The eligibility guard declined.
    Suppressed(SuppressReason),
    /// No VM service URI was supplied, so there was nothing to publish.
    NoVmService,
    /// Metadata collection or the transport failed. Logged, never raised.
    Failed(String),
}

/// Advertises a debug session's VM service on the local network.
///
/// Every collaborator is injected, so tests substitute fakes directly.
pub struct Advertiser {
    bot_detector: Arc<dyn BotDetector>,
    transport: Arc<dyn Transport>,
    device: Arc<dyn DeviceMetadata>,
    versions: Arc<dyn VersionProvider>,
    clock: Arc<dyn Clock>,
    enable_local_discovery: bool,
    hostname: String,
    mode: String,
    pid: u64,
    state: AdvertiserState,
}

impl Advertiser {
    /// Create an advertiser using the system clock, local hostname, the
    /// current process id and `debug` build mode.
    pub fn new(
        bot_detector: Arc<dyn BotDetector>,
        transport: Arc<dyn Transport>,
        device: Arc<dyn DeviceMetadata>,
        versions: Arc<dyn VersionProvider>,
    ) -> Self {
        Self {
            bot_detector,
            transport,
            device,
            versions,
            clock: Arc::new(SystemClock),
            enable_local_discovery: true,
            hostname: local_hostname(),
            mode: "debug".to_string(),
            pid: u64::from(std::process::id()),
            state: AdvertiserState::Idle,
        }
    }

    /// Set the local discovery flag.
    pub fn with_local_discovery(mut self, enabled: bool) -> Self {
        self.enable_local_discovery = enabled;
        self
    }

    /// Set the build mode identifier.
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }

    /// Set the clock used for the record epoch.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Override the advertised hostname.
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// Override the advertised process id.
    pub fn with_pid(mut self, pid: u64) -> Self {
        self.pid = pid;
        self
    }

    pub fn state(&self) -> &AdvertiserState {
        &self.state
    }

    /// Check if currently advertising.
    pub fn is_advertising(&self) -> bool {
        matches!(self.state, AdvertiserState::Advertising(_))
    }

    /// Advertise `app_name`'s VM service.
    ///
    /// Only an empty `app_name` is an error. Suppression, a missing VM
    /// service and transport failures are reported through the outcome and
    /// the log. State changes only after the guard and metadata queries have
    /// completed, so dropping the future before then leaves no trace.
    /// Advertising again replaces the previous responder; if the new attempt
    /// is suppressed or fails, the previous responder is stopped.
    pub async fn advertise(
        &mut self,
        app_name: &str,
        vm_service_uri: Option<&str>,
        dtd_uri: Option<&str>,
    ) -> Result<AdvertiseOutcome, DiscoverError> {
        if app_name.is_empty() {
            return Err(DiscoverError::InvalidInput(
                "app name must not be empty".to_string(),
            ));
        }

        if let Eligibility::Suppressed(reason) =
            guard::evaluate(self.bot_detector.as_ref(), self.enable_local_discovery).await
        {
            debug!(app_name, reason = %reason, "mDNS advertisement suppressed");
            self.stop().await;
            self.state = AdvertiserState::Suppressed(reason);
            return Ok(AdvertiseOutcome::Suppressed(reason));
        }

        let Some(ws_uri) = vm_service_uri.filter(|uri| !uri.is_empty()) else {
            trace!(app_name, "No VM service URI; nothing to advertise over mDNS");
            return Ok(AdvertiseOutcome::NoVmService);
        };

        let record = match self.build_record(app_name, ws_uri, dtd_uri).await {
            Ok(record) => record,
            Err(e) => return Ok(self.fail(app_name, e).await),
        };
        let port = match service_port(ws_uri) {
            Ok(port) => port,
            Err(e) => return Ok(self.fail(app_name, e).await),
        };

        self.stop().await;

        match self
            .transport
            .start_responding(app_name, port, &record.encode())
            .await
        {
            Ok(()) => {
                info!(app_name, ws_uri, port, "Debug session advertised via mDNS");
                self.state = AdvertiserState::Advertising(app_name.to_string());
                Ok(AdvertiseOutcome::Advertising(record))
            }
            Err(e) => Ok(self.fail(app_name, e).await),
        }
    }

    /// Stop the active advertisement, if any.
    ///
    /// A transport error is logged and the advertiser still ends up
    /// `Stopped`.
    pub async fn stop(&mut self) {
        if let AdvertiserState::Advertising(app_name) = &self.state {
            if let Err(e) = self.transport.stop(app_name).await {
                warn!(app_name = %app_name, error = %e, "Failed to stop mDNS advertisement");
            }
            self.state = AdvertiserState::Stopped;
        }
    }

    async fn build_record(
        &self,
        app_name: &str,
        ws_uri: &str,
        dtd_uri: Option<&str>,
    ) -> Result<ObservationRecord, DiscoverError> {
        let target_platform = self.device.target_platform().await?;
        ObservationRecord::builder()
            .with_hostname(self.hostname.as_str())
            .with_project_name(app_name)
            .with_device_name(self.device.name())
            .with_device_id(self.device.id())
            .with_target_platform(target_platform)
            .with_mode(self.mode.as_str())
            .with_ws_uri(ws_uri)
            .with_epoch(self.clock.now())
            .with_pid(self.pid)
            .with_flutter_version(self.versions.framework_version())
            .with_dart_version(self.versions.sdk_version())
            .with_dtd_uri(dtd_uri)
            .build()
    }

    /// Record a best-effort failure, stopping any responder left from an
    /// earlier call.
    async fn fail(&mut self, app_name: &str, error: DiscoverError) -> AdvertiseOutcome {
        self.stop().await;
        warn!(
            app_name,
            error = %error,
            "mDNS advertisement failed; local discovery of this session is unavailable"
        );
        self.state = AdvertiserState::Stopped;
        AdvertiseOutcome::Failed(error.to_string())
    }
}

/// Port to put in the SRV record: the URI's explicit port, else its scheme
/// default.
fn service_port(ws_uri: &str) -> Result<u16, DiscoverError> {
    let url = Url::parse(ws_uri)
        .map_err(|e| DiscoverError::ServiceInfo(format!("invalid VM service URI {ws_uri}: {e}")))?;
    url.port_or_known_default().ok_or_else(|| {
        DiscoverError::ServiceInfo(format!("VM service URI {ws_uri} has no port"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_port_explicit() {
        assert_eq!(service_port("http://127.0.0.1:1234/auth/").unwrap(), 1234);
        assert_eq!(service_port("ws://127.0.0.1:8181/abc=/ws").unwrap(), 8181);
    }

    #[test]
    fn test_service_port_scheme_default() {
        assert_eq!(service_port("https://example.com/abc/").unwrap(), 443);
        assert_eq!(service_port("ws://example.com/abc/").unwrap(), 80);
    }

    #[test]
    fn test_service_port_rejects_unparsable() {
        assert!(matches!(
            service_port("not a uri"),
            Err(DiscoverError::ServiceInfo(_))
        ));
        assert!(service_port("custom://host/path").is_err());
    }
}

//! Test doubles for the advertiser's collaborators.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use vmbeacon_discover::{BotDetector, Clock, DeviceMetadata, DiscoverError, Transport};

/// Bot detector returning a fixed verdict and counting queries.
#[derive(Clone)]
pub struct StaticBotDetector {
    verdict: bool,
    calls: Arc<AtomicUsize>,
}

impl StaticBotDetector {
    pub fn new(verdict: bool) -> Self {
        Self {
            verdict,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Detector reporting a CI/bot context.
    pub fn bot() -> Self {
        Self::new(true)
    }

    /// Detector reporting an interactive context.
    pub fn human() -> Self {
        Self::new(false)
    }

    /// Number of times the detector was queried.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BotDetector for StaticBotDetector {
    async fn is_running_on_bot(&self) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.verdict
    }
}

/// Bot detector that never answers.
pub struct PendingBotDetector;

#[async_trait]
impl BotDetector for PendingBotDetector {
    async fn is_running_on_bot(&self) -> bool {
        std::future::pending::<()>().await;
        true
    }
}

/// A recorded `start_responding` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartCall {
    pub app_name: String,
    pub port: u16,
    pub encoded_record: String,
}

#[derive(Default)]
struct TransportLog {
    starts: Vec<StartCall>,
    stops: Vec<String>,
    active: HashSet<String>,
    fail_start: Option<String>,
    fail_stop: Option<String>,
}

/// In-memory transport recording every call.
///
/// Clones share the same log, so a test keeps one handle while the
/// advertiser owns another.
#[derive(Clone, Default)]
pub struct FakeTransport {
    log: Arc<Mutex<TransportLog>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport whose every start fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        let transport = Self::new();
        transport.log.lock().unwrap().fail_start = Some(message.into());
        transport
    }

    /// Make every later `stop` fail with `message`, leaving the responder
    /// running.
    pub fn fail_stops(&self, message: impl Into<String>) {
        self.log.lock().unwrap().fail_stop = Some(message.into());
    }

    /// Recorded start calls, successful or not.
    pub fn starts(&self) -> Vec<StartCall> {
        self.log.lock().unwrap().starts.clone()
    }

    /// App names passed to `stop`.
    pub fn stops(&self) -> Vec<String> {
        self.log.lock().unwrap().stops.clone()
    }

    /// Whether `app_name` is currently responding.
    pub fn is_responding(&self, app_name: &str) -> bool {
        self.log.lock().unwrap().active.contains(app_name)
    }

    /// Number of app names currently responding.
    pub fn active_count(&self) -> usize {
        self.log.lock().unwrap().active.len()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn start_responding(
        &self,
        app_name: &str,
        port: u16,
        encoded_record: &str,
    ) -> Result<(), DiscoverError> {
        let mut log = self.log.lock().unwrap();
        log.starts.push(StartCall {
            app_name: app_name.to_string(),
            port,
            encoded_record: encoded_record.to_string(),
        });
        if let Some(ref message) = log.fail_start {
            return Err(DiscoverError::Transport(message.clone()));
        }
        log.active.insert(app_name.to_string());
        Ok(())
    }

    async fn stop(&self, app_name: &str) -> Result<(), DiscoverError> {
        let mut log = self.log.lock().unwrap();
        log.stops.push(app_name.to_string());
        if let Some(ref message) = log.fail_stop {
            return Err(DiscoverError::Transport(message.clone()));
        }
        log.active.remove(app_name);
        Ok(())
    }
}

/// Clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}

/// Device whose target platform query always fails.
#[derive(Debug, Clone, Default)]
pub struct FailingDevice;

#[async_trait]
impl DeviceMetadata for FailingDevice {
    fn name(&self) -> String {
        "unreachable".to_string()
    }

    fn id(&self) -> String {
        "unreachable-id".to_string()
    }

    async fn target_platform(&self) -> Result<String, DiscoverError> {
        Err(DiscoverError::Metadata("device disconnected".to_string()))
    }
}

//! Session metadata collaborators: clock, device and version information.

use async_trait::async_trait;

use crate::error::DiscoverError;

/// Source of the record timestamp.
pub trait Clock: Send + Sync {
    /// Current time as an epoch integer.
    fn now(&self) -> u64;
}

/// Wall clock reporting Unix milliseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
    }
}

/// Describes the device the debugged application runs on.
#[async_trait]
pub trait DeviceMetadata: Send + Sync {
    fn name(&self) -> String;

    fn id(&self) -> String;

    /// Target platform identifier, e.g. `android`. May require querying the
    /// device.
    async fn target_platform(&self) -> Result<String, DiscoverError>;
}

/// Device metadata known up front.
#[derive(Debug, Clone)]
pub struct StaticDevice {
    pub name: String,
    pub id: String,
    pub target_platform: String,
}

impl StaticDevice {
    pub fn new(
        name: impl Into<String>,
        id: impl Into<String>,
        target_platform: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            target_platform: target_platform.into(),
        }
    }

    /// The machine running this process, described by its hostname and
    /// compile-time OS.
    pub fn host() -> Self {
        let name = local_hostname();
        Self::new(name.clone(), name, std::env::consts::OS)
    }
}

#[async_trait]
impl DeviceMetadata for StaticDevice {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn id(&self) -> String {
        self.id.clone()
    }

    async fn target_platform(&self) -> Result<String, DiscoverError> {
        Ok(self.target_platform.clone())
    }
}

/// Framework and SDK version strings.
pub trait VersionProvider: Send + Sync {
    fn framework_version(&self) -> String;

    fn sdk_version(&self) -> String;
}

/// Version strings known up front.
#[derive(Debug, Clone)]
pub struct StaticVersions {
    pub framework: String,
    pub sdk: String,
}

impl StaticVersions {
    pub fn new(framework: impl Into<String>, sdk: impl Into<String>) -> Self {
        Self {
            framework: framework.into(),
            sdk: sdk.into(),
        }
    }
}

impl VersionProvider for StaticVersions {
    fn framework_version(&self) -> String {
        self.framework.clone()
    }

    fn sdk_version(&self) -> String {
        self.sdk.clone()
    }
}

/// Hostname of this machine, or `localhost` if it cannot be determined.
pub fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

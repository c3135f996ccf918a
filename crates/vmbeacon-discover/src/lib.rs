//! mDNS advertisement and discovery of VM service debug sessions.
//!
//! A running application announces its VM service URI (and optionally its
//! Dev Tools Daemon URI) on the local network; tooling browses for these
//! announcements and parses their TXT records back into
//! [`ObservationRecord`]s.
//!
//! # Service Type
//!
//! Sessions are advertised using the service type `_dartVmService._tcp.local.`
//!
//! # Example: Advertising a Session
//!
//! ```no_run
//! use std::sync::Arc;
//! use vmbeacon_discover::{
//!     Advertiser, CiBotDetector, StaticDevice, StaticVersions, ZeroconfTransport,
//! };
//!
//! # async fn run() -> Result<(), vmbeacon_discover::DiscoverError> {
//! let mut advertiser = Advertiser::new(
//!     Arc::new(CiBotDetector::new()),
//!     Arc::new(ZeroconfTransport::new()),
//!     Arc::new(StaticDevice::new("Pixel 7", "emulator-5554", "android")),
//!     Arc::new(StaticVersions::new("3.24.0", "3.5.0")),
//! );
//!
//! let outcome = advertiser
//!     .advertise("counter", Some("http://127.0.0.1:8181/abc=/"), None)
//!     .await?;
//! println!("{outcome:?}");
//!
//! advertiser.stop().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Example: Discovering Sessions
//!
//! ```no_run
//! use vmbeacon_discover::Browser;
//! use std::time::Duration;
//!
//! let browser = Browser::new().expect("Failed to create browser");
//! let sessions = browser.browse(Duration::from_secs(3)).expect("Failed to browse");
//!
//! for session in sessions {
//!     println!("Found: {} at {}", session.name, session.record.ws_uri());
//! }
//! ```

mod advertise;
mod bot;
mod browse;
pub mod config;
mod error;
pub mod guard;
mod metadata;
pub mod record;
mod service;
mod transport;

pub use advertise::{AdvertiseOutcome, Advertiser, AdvertiserState};
pub use bot::CiBotDetector;
pub use browse::Browser;
pub use config::DiscoveryConfig;
pub use error::{ConfigError, DiscoverError};
pub use guard::{BotDetector, Eligibility, SuppressReason};
pub use metadata::{
    local_hostname, Clock, DeviceMetadata, StaticDevice, StaticVersions, SystemClock,
    VersionProvider,
};
pub use record::{ObservationRecord, ObservationRecordBuilder, DTD_URI_KEY};
pub use service::{DiscoveredSession, SERVICE_TYPE};
pub use transport::{Transport, ZeroconfTransport};

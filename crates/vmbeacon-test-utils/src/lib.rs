//! Testing utilities and test doubles for vmbeacon.
//!
//! - **Mocks**: recording transport, scripted bot detector, fixed metadata
//! - **Logs**: capture of tracing output for asserting on diagnostics
//! - **Fixtures**: ready-made advertisers with fixed metadata
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use vmbeacon_test_utils::fixtures::advertiser_with;
//! use vmbeacon_test_utils::mocks::{FakeTransport, StaticBotDetector};
//!
//! #[tokio::test]
//! async fn test_bot_suppresses() {
//!     let transport = FakeTransport::new();
//!     let mut advertiser = advertiser_with(StaticBotDetector::bot(), transport.clone());
//!     advertiser.advertise("app", Some("http://127.0.0.1:1/"), None).await.unwrap();
//!     assert!(transport.starts().is_empty());
//! }
//! ```

pub mod fixtures;
pub mod logs;
pub mod mocks;

pub use logs::LogCapture;
pub use mocks::{FailingDevice, FakeTransport, FixedClock, PendingBotDetector, StaticBotDetector};

//! Ready-made advertisers.

use std::sync::Arc;

use vmbeacon_discover::{
    Advertiser, BotDetector, DeviceMetadata, StaticDevice, StaticVersions, Transport,
};

use crate::mocks::FixedClock;

/// Epoch reported by fixture advertisers.
pub const FIXED_EPOCH: u64 = 1_700_000_000_000;

/// Process id reported by fixture advertisers.
pub const FIXED_PID: u64 = 4242;

/// Fixture device: a Pixel 7 emulator.
pub fn device() -> StaticDevice {
    StaticDevice::new("Pixel 7", "emulator-5554", "android")
}

/// Advertiser with fixed metadata, local discovery enabled.
pub fn advertiser_with(
    bot_detector: impl BotDetector + 'static,
    transport: impl Transport + 'static,
) -> Advertiser {
    advertiser_with_device(bot_detector, transport, device())
}

/// Advertiser with fixed metadata and a custom device.
pub fn advertiser_with_device(
    bot_detector: impl BotDetector + 'static,
    transport: impl Transport + 'static,
    device: impl DeviceMetadata + 'static,
) -> Advertiser {
    Advertiser::new(
        Arc::new(bot_detector),
        Arc::new(transport),
        Arc::new(device),
        Arc::new(StaticVersions::new("3.24.0", "3.5.0")),
    )
    .with_clock(Arc::new(FixedClock(FIXED_EPOCH)))
    .with_hostname("devbox")
    .with_pid(FIXED_PID)
}

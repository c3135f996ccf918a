//! Service information types.

use std::net::SocketAddr;

use zeroconf::ServiceType;

use crate::error::DiscoverError;
use crate::record::ObservationRecord;

/// The mDNS service type for VM service debug sessions.
pub const SERVICE_TYPE: &str = "_dartVmService._tcp.local.";

const SERVICE_NAME: &str = "dartVmService";
const SERVICE_PROTOCOL: &str = "tcp";

pub(crate) fn service_type() -> Result<ServiceType, DiscoverError> {
    ServiceType::new(SERVICE_NAME, SERVICE_PROTOCOL)
        .map_err(|e| DiscoverError::ServiceInfo(e.to_string()))
}

/// A debug session found on the local network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredSession {
    /// mDNS instance name (the advertised app name).
    pub name: String,
    /// Socket address the advertisement resolved to.
    pub address: SocketAddr,
    /// The session's parsed TXT record.
    pub record: ObservationRecord,
}

impl std::fmt::Display for DiscoveredSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.name, self.address, self.record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_service_type_constant() {
        assert_eq!(SERVICE_TYPE, "_dartVmService._tcp.local.");
        assert_eq!(
            SERVICE_TYPE,
            format!("_{SERVICE_NAME}._{SERVICE_PROTOCOL}.local.")
        );
    }

    #[test]
    fn test_discovered_session_display() {
        let record = ObservationRecord::builder()
            .with_project_name("counter")
            .with_device_name("Pixel 7")
            .with_target_platform("android")
            .with_mode("debug")
            .with_ws_uri("http://127.0.0.1:8181/abc=/")
            .build()
            .unwrap();
        let session = DiscoveredSession {
            name: "counter".to_string(),
            address: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 100)), 8181),
            record,
        };
        assert_eq!(
            session.to_string(),
            "counter (192.168.1.100:8181): counter on Pixel 7 (android, debug) http://127.0.0.1:8181/abc=/"
        );
    }
}

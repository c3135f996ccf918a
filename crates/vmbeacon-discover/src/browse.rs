//! Session discovery (browsing) via mDNS using native Bonjour/Avahi.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};
use zeroconf::prelude::*;
use zeroconf::{BrowserEvent, MdnsBrowser, TxtRecord};

use crate::error::DiscoverError;
use crate::record::ObservationRecord;
use crate::service::{service_type, DiscoveredSession};

type Sessions = Arc<Mutex<SessionTable>>;

/// Sessions seen so far, in the order they were first discovered.
#[derive(Debug, Default)]
struct SessionTable {
    sessions: Vec<DiscoveredSession>,
}

impl SessionTable {
    /// Add a session, replacing one with the same instance name in place.
    fn upsert(&mut self, session: DiscoveredSession) {
        match self.sessions.iter_mut().find(|s| s.name == session.name) {
            Some(existing) => *existing = session,
            None => self.sessions.push(session),
        }
    }

    fn remove(&mut self, name: &str) {
        self.sessions.retain(|s| s.name != name);
    }

    fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Earliest discovered session still present.
    fn first(&self) -> Option<&DiscoveredSession> {
        self.sessions.first()
    }

    fn to_vec(&self) -> Vec<DiscoveredSession> {
        self.sessions.clone()
    }
}

/// Browses for advertised debug sessions on the local network via mDNS.
pub struct Browser {
    // Browser doesn't hold state - created fresh for each browse operation
}

impl Browser {
    /// Create a new browser.
    pub fn new() -> Result<Self, DiscoverError> {
        Ok(Self {})
    }

    /// Browse for sessions with a timeout.
    ///
    /// Blocks for the full timeout and returns every session whose TXT record
    /// parsed. Advertisements with malformed records are skipped.
    pub fn browse(&self, timeout: Duration) -> Result<Vec<DiscoveredSession>, DiscoverError> {
        info!(
            timeout_secs = timeout.as_secs_f32(),
            "Browsing for debug sessions"
        );

        let sessions = browse_until(timeout, false)?;
        let result = sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .to_vec();

        info!(count = result.len(), "Browse completed");

        Ok(result)
    }

    /// Browse for a single session with a timeout.
    ///
    /// Returns as soon as a session is found, or None if timeout expires.
    pub fn browse_one(
        &self,
        timeout: Duration,
    ) -> Result<Option<DiscoveredSession>, DiscoverError> {
        debug!(
            timeout_secs = timeout.as_secs_f32(),
            "Browsing for first debug session"
        );

        let sessions = browse_until(timeout, true)?;
        let first = sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .first()
            .cloned();
        Ok(first)
    }
}

fn browse_until(timeout: Duration, stop_at_first: bool) -> Result<Sessions, DiscoverError> {
    let mut browser = MdnsBrowser::new(service_type()?);

    let sessions: Sessions = Arc::new(Mutex::new(SessionTable::default()));
    let sessions_clone = sessions.clone();

    browser.set_service_callback(Box::new(move |result, _context| {
        on_service_event(result, &sessions_clone);
    }));

    let event_loop = browser.browse_services()?;

    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        let remaining = deadline.saturating_duration_since(Instant::now());
        event_loop.poll(remaining.min(Duration::from_millis(100)))?;

        if stop_at_first
            && !sessions
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_empty()
        {
            break;
        }
    }

    Ok(sessions)
}

fn on_service_event(result: zeroconf::Result<BrowserEvent>, sessions: &Sessions) {
    match result {
        Ok(BrowserEvent::Add(discovery)) => {
            trace!(
                name = %discovery.name(),
                service_type = ?discovery.service_type(),
                domain = %discovery.domain(),
                "Service discovered"
            );

            let address = resolve_address(discovery.address(), *discovery.port());
            match discovery.txt().as_ref().and_then(record_from_txt) {
                Some(record) => {
                    debug!(
                        name = %discovery.name(),
                        address = %address,
                        ws_uri = %record.ws_uri(),
                        "Found debug session"
                    );
                    sessions
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .upsert(DiscoveredSession {
                            name: discovery.name().to_string(),
                            address,
                            record,
                        });
                }
                None => {
                    debug!(
                        name = %discovery.name(),
                        "Ignoring advertisement with malformed TXT record"
                    );
                }
            }
        }
        Ok(BrowserEvent::Remove(removal)) => {
            debug!(name = %removal.name(), "Service removed");
            sessions
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(removal.name());
        }
        Err(e) => {
            warn!(error = %e, "Service discovery error");
        }
    }
}

/// Rebuild wire text from a TXT record and parse it.
fn record_from_txt(txt: &TxtRecord) -> Option<ObservationRecord> {
    let text = txt
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("\n");
    ObservationRecord::parse(&text)
}

/// An unspecified address means the service listens on every interface, so
/// loopback reaches it.
fn resolve_address(address: &str, port: u16) -> SocketAddr {
    let ip = match address.parse::<IpAddr>() {
        Ok(ip) if !ip.is_unspecified() => ip,
        _ => IpAddr::V4(Ipv4Addr::LOCALHOST),
    };
    SocketAddr::new(ip, port)
}

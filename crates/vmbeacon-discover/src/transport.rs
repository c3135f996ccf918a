//! mDNS responder transport using native Bonjour/Avahi.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};
use zeroconf::prelude::*;
use zeroconf::{MdnsService, ServiceRegistration, TxtRecord};

use crate::error::DiscoverError;
use crate::service::{service_type, SERVICE_TYPE};

/// How long each responder thread blocks in one event loop poll.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Publishes encoded records so they answer discovery queries.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Start answering queries for `app_name` with the encoded record as the
    /// TXT payload. Starting an `app_name` that is already responding
    /// replaces it.
    async fn start_responding(
        &self,
        app_name: &str,
        port: u16,
        encoded_record: &str,
    ) -> Result<(), DiscoverError>;

    /// Stop answering queries for `app_name`. Stopping an unknown name is a
    /// no-op.
    async fn stop(&self, app_name: &str) -> Result<(), DiscoverError>;
}

/// Transport registering `_dartVmService._tcp` services with the platform
/// mDNS daemon.
///
/// Each registration owns a thread that polls its zeroconf event loop until
/// stopped.
#[derive(Default)]
pub struct ZeroconfTransport {
    registrations: Mutex<HashMap<String, Registration>>,
}

struct Registration {
    fullname: String,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Registration {
    fn shutdown(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!(fullname = %self.fullname, "mDNS responder thread panicked");
            }
        }
        info!(fullname = %self.fullname, "Stopped mDNS advertisement");
    }
}

impl ZeroconfTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if `app_name` is currently registered.
    pub fn is_responding(&self, app_name: &str) -> bool {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(app_name)
    }

    fn take(&self, app_name: &str) -> Option<Registration> {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(app_name)
    }
}

#[async_trait]
impl Transport for ZeroconfTransport {
    async fn start_responding(
        &self,
        app_name: &str,
        port: u16,
        encoded_record: &str,
    ) -> Result<(), DiscoverError> {
        let txt = txt_entries(encoded_record)?;

        if let Some(previous) = self.take(app_name) {
            debug!(app_name, "Replacing existing mDNS advertisement");
            shutdown_blocking(previous).await?;
        }

        let stop = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = oneshot::channel();
        let name = app_name.to_string();
        let thread_stop = stop.clone();

        debug!(app_name, port, "Registering mDNS service");

        let thread = std::thread::Builder::new()
            .name(format!("mdns-{app_name}"))
            .spawn(move || run_responder(&name, port, &txt, &thread_stop, ready_tx))
            .map_err(|e| DiscoverError::Transport(e.to_string()))?;

        let fullname = match ready_rx.await {
            Ok(Ok(fullname)) => fullname,
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e);
            }
            Err(_) => {
                let _ = thread.join();
                return Err(DiscoverError::Transport(
                    "responder exited before registering".to_string(),
                ));
            }
        };

        info!(
            app_name,
            port,
            fullname = %fullname,
            "Advertising debug session via mDNS"
        );

        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                app_name.to_string(),
                Registration {
                    fullname,
                    stop,
                    thread: Some(thread),
                },
            );
        Ok(())
    }

    async fn stop(&self, app_name: &str) -> Result<(), DiscoverError> {
        match self.take(app_name) {
            Some(registration) => shutdown_blocking(registration).await,
            None => Ok(()),
        }
    }
}

impl Drop for ZeroconfTransport {
    fn drop(&mut self) {
        let registrations = std::mem::take(
            self.registrations
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for (_, registration) in registrations {
            registration.shutdown();
        }
    }
}

async fn shutdown_blocking(registration: Registration) -> Result<(), DiscoverError> {
    tokio::task::spawn_blocking(move || registration.shutdown())
        .await
        .map_err(|e| DiscoverError::Transport(e.to_string()))
}

/// Split encoded record text into TXT key/value pairs.
pub(crate) fn txt_entries(encoded_record: &str) -> Result<Vec<(String, String)>, DiscoverError> {
    encoded_record
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.split_once('=')
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .ok_or_else(|| DiscoverError::ServiceInfo(format!("malformed TXT line: {line}")))
        })
        .collect()
}

fn run_responder(
    name: &str,
    port: u16,
    txt: &[(String, String)],
    stop: &AtomicBool,
    ready: oneshot::Sender<Result<String, DiscoverError>>,
) {
    let (_service, event_loop) = match register(name, port, txt) {
        Ok(registered) => registered,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    let fullname = format!("{name}.{SERVICE_TYPE}");
    if ready.send(Ok(fullname)).is_err() {
        return;
    }

    while !stop.load(Ordering::SeqCst) {
        if let Err(e) = event_loop.poll(POLL_INTERVAL) {
            warn!(error = %e, name, "mDNS event loop failed");
            break;
        }
    }
}

fn register(
    name: &str,
    port: u16,
    txt: &[(String, String)],
) -> Result<(MdnsService, zeroconf::EventLoop), DiscoverError> {
    let mut service = MdnsService::new(service_type()?, port);
    service.set_name(name);

    let mut txt_record = TxtRecord::new();
    for (key, value) in txt {
        txt_record
            .insert(key, value)
            .map_err(|e| DiscoverError::ServiceInfo(e.to_string()))?;
    }
    service.set_txt_record(txt_record);
    service.set_registered_callback(Box::new(on_service_registered));

    let event_loop = service.register()?;
    event_loop.poll(POLL_INTERVAL)?;

    Ok((service, event_loop))
}

fn on_service_registered(
    result: zeroconf::Result<ServiceRegistration>,
    _context: Option<Arc<dyn Any + Send + Sync>>,
) {
    match result {
        Ok(registration) => {
            info!(
                name = %registration.name(),
                service_type = ?registration.service_type(),
                domain = %registration.domain(),
                "Service registered successfully"
            );
        }
        Err(e) => {
            error!(error = %e, "Failed to register service");
        }
    }
}

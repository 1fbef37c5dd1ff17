//! Shared test support: a recording device transport
//!
//! Records every property push so tests can assert on push order, counts,
//! and payloads; optionally fails on a chosen property id to exercise the
//! abort paths.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use videoctl_session_core::{DeviceProperty, DeviceTransport, TransportError};

/// Handle onto a transport's recorded pushes.
#[derive(Clone)]
pub struct PushLog {
    inner: Arc<Mutex<Vec<DeviceProperty>>>,
}

impl PushLog {
    /// Everything pushed so far.
    pub fn pushed(&self) -> Vec<DeviceProperty> {
        self.inner.lock().unwrap().clone()
    }

    /// Property ids in push order.
    pub fn ids(&self) -> Vec<u32> {
        self.inner.lock().unwrap().iter().map(|p| p.id).collect()
    }

    /// How many times one property id was pushed.
    pub fn count(&self, id: u32) -> usize {
        self.inner.lock().unwrap().iter().filter(|p| p.id == id).count()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.inner.lock().unwrap().clear();
    }

    /// Whether nothing was pushed.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }
}

/// Transport that records pushes instead of talking to hardware.
pub struct RecordingTransport {
    log: Arc<Mutex<Vec<DeviceProperty>>>,
    fail_on: Option<u32>,
}

impl RecordingTransport {
    /// Transport plus the log handle observing it.
    pub fn new() -> (Self, PushLog) {
        let inner = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                log: Arc::clone(&inner),
                fail_on: None,
            },
            PushLog { inner },
        )
    }

    /// Recording transport that rejects one property id.
    pub fn failing_on(id: u32) -> (Self, PushLog) {
        let (mut transport, log) = Self::new();
        transport.fail_on = Some(id);
        (transport, log)
    }
}

impl DeviceTransport for RecordingTransport {
    fn push_property(&mut self, prop: DeviceProperty) -> Result<(), TransportError> {
        if self.fail_on == Some(prop.id) {
            return Err(TransportError::Rejected {
                id: prop.id,
                reason: "injected failure".into(),
            });
        }
        self.log.lock().unwrap().push(prop);
        Ok(())
    }
}

/// Install the test log subscriber once per binary.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}

//! VideoCtl Session Core - capability control engine for hardware codec
//! sessions
//!
//! This crate negotiates and commits the interdependent runtime controls of
//! a hardware-accelerated codec session: resolution, bitrate, profile,
//! quality modes, layering, low-latency mode, and friends. Controls form a
//! dependency graph (a quality mode derives its legal value from the
//! rate-control mode, long-term references from the layer structure) and
//! clients write them in arbitrary order, before or after the session goes
//! active.
//!
//! # Architecture
//!
//! - A per-session **capability registry** is seeded from a static
//!   template keyed by (domain, codec)
//! - A cached **dependency list** (topological order with cycle detection
//!   and build-time graph validation) sequences all value resolution and
//!   device programming
//! - The **adjustment engine** resolves values: a full pass before the
//!   session starts streaming, and an incremental, equality-gated cascade
//!   for each dynamic write afterwards
//! - The **commit engine** drains pending updates in dependency order,
//!   pushing each changed capability to the device exactly once per change
//!
//! The device itself sits behind the [`transport::DeviceTransport`] trait;
//! this crate never touches a wire format.
//!
//! # Example
//!
//! ```ignore
//! use videoctl_session_core::{CapabilityId, Codec, Domain, Engine};
//!
//! let engine = Engine::new();
//! let session = engine.open_session(Domain::Encoder, Codec::H264, transport)?;
//!
//! let mut session = session.lock();
//! session.set_control(CapabilityId::BitrateMode, 1)?; // CBR
//! session.set_control(CapabilityId::Bitrate, 6_000_000)?;
//! session.start_streaming()?; // resolves and programs everything
//!
//! // post-streaming writes cascade through dependents and commit
//! session.set_control(CapabilityId::Bitrate, 4_000_000)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod controls;
pub mod engine;
pub mod error;
pub mod platform;
pub mod session;
pub mod transport;

pub use controls::{
    CapabilityFlags, CapabilityId, CapabilitySet, Codec, ControlDescriptor, ControlKind,
    DependencyList, Domain,
};
pub use engine::{Engine, EngineConfig};
pub use error::{Error, Result};
pub use session::{Session, SessionId};
pub use transport::{DeviceProperty, DeviceTransport, PropertyPayload, PropertyPort, TransportError};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string.
pub fn version() -> &'static str {
    VERSION
}

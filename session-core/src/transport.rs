//! Device transport boundary
//!
//! The control engine never talks to the device directly. Commit callbacks
//! serialize a capability's resolved value into a [`DeviceProperty`] and hand
//! it to a [`DeviceTransport`] implementation, which owns the actual wire
//! format and delivery. The engine treats the result as opaque
//! success/failure; retry and suspension semantics live behind the trait.

use thiserror::Error;

/// Port a property applies to on the device side.
///
/// Encoder bitstream properties ride the output port, raw-frame properties
/// the input port. Capabilities flagged for both ports route to the input
/// port once streaming has started and to the output port before that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyPort {
    /// Not tied to a specific port
    None,
    /// Input (raw frame) port
    Input,
    /// Output (bitstream) port
    Output,
}

/// Typed payload for a device property push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyPayload {
    /// Plain 32-bit value
    U32(u32),
    /// Device-side enumerant
    U32Enum(u32),
    /// Two packed 32-bit values
    U32Pair([u32; 2]),
    /// 64-bit value
    U64(u64),
}

/// One property/parameter update destined for the device firmware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProperty {
    /// Device-side property identifier
    pub id: u32,
    /// Target port
    pub port: PropertyPort,
    /// Serialized value
    pub payload: PropertyPayload,
}

/// Errors surfaced by the transport layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The device rejected the property update
    #[error("device rejected property {id:#x}: {reason}")]
    Rejected {
        /// Device-side property identifier
        id: u32,
        /// Device-reported reason
        reason: String,
    },

    /// The device could not be reached
    #[error("device unreachable: {0}")]
    Unreachable(String),
}

/// Synchronous push channel to the device firmware.
///
/// Calls are synchronous and bounded-latency from the engine's perspective;
/// one session drives one transport, under the session lock.
pub trait DeviceTransport: Send {
    /// Push a single property update to the device.
    fn push_property(&mut self, prop: DeviceProperty) -> Result<(), TransportError>;
}

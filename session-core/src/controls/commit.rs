//! Commit engine
//!
//! Drains a pending-commit set by invoking each capability's device-push
//! callback in dependency order. The pending set is intersected with the
//! cached dependency list, so the device always sees a capability's
//! prerequisites applied before the capability itself regardless of the
//! order in which the adjustment pass discovered changes.
//!
//! A capability whose resolved value already matches the last value pushed
//! is skipped, so repeated no-op writes reach the device at most once per
//! actual change. The first transport failure aborts the remaining drain;
//! already-pushed values stay on the device (no rollback).

use tracing::{debug, trace, warn};

use crate::controls::deplist::DependencyList;
use crate::controls::registry::CapabilityTable;
use crate::controls::types::{CapabilityFlags, CapabilityId, CapabilitySet, SessionInfo};
use crate::error::Result;
use crate::transport::{DeviceTransport, PropertyPort, TransportError};

// =============================================================================
// Commit callback contract
// =============================================================================

/// Read-only view handed to commit callbacks.
pub struct CommitCtx<'a> {
    table: &'a CapabilityTable,
    info: &'a SessionInfo,
    cap: CapabilityId,
    value: i64,
    device_id: u32,
    flags: CapabilityFlags,
}

impl<'a> CommitCtx<'a> {
    /// Capability being pushed.
    pub fn cap(&self) -> CapabilityId {
        self.cap
    }

    /// Resolved value to serialize.
    pub fn value(&self) -> i64 {
        self.value
    }

    /// Device-side property identifier from the template.
    pub fn device_id(&self) -> u32 {
        self.device_id
    }

    /// Session facts.
    pub fn info(&self) -> &SessionInfo {
        self.info
    }

    /// Current value of any registered capability, for pushes that pack
    /// several values into one property.
    pub fn value_of(&self, id: CapabilityId) -> Option<i64> {
        self.table.get(id).ok().map(|record| record.value)
    }

    /// Port routing derived from the capability's port flags.
    ///
    /// Dual-port capabilities ride the output port while the session is
    /// still being configured and the input port once it is streaming.
    pub fn port(&self) -> PropertyPort {
        let input = self.flags.contains(CapabilityFlags::INPUT_PORT);
        let output = self.flags.contains(CapabilityFlags::OUTPUT_PORT);
        match (input, output) {
            (true, true) => {
                if self.info.streaming {
                    PropertyPort::Input
                } else {
                    PropertyPort::Output
                }
            }
            (true, false) => PropertyPort::Input,
            (false, true) => PropertyPort::Output,
            (false, false) => PropertyPort::None,
        }
    }
}

/// Device serialization policy for one capability kind.
pub trait CommitOp: Send + Sync {
    /// Serialize the capability's resolved value and push it.
    fn commit(
        &self,
        ctx: &CommitCtx<'_>,
        transport: &mut dyn DeviceTransport,
    ) -> std::result::Result<(), TransportError>;
}

// =============================================================================
// Drain passes
// =============================================================================

/// Push one capability if it has a commit callback and its value moved
/// since the last successful push.
fn commit_capability(
    table: &mut CapabilityTable,
    info: &SessionInfo,
    cap: CapabilityId,
    transport: &mut dyn DeviceTransport,
) -> Result<()> {
    let (op, value, device_id, flags, last_pushed) = {
        let record = table.get(cap)?;
        (
            record.commit,
            record.value,
            record.device_id,
            record.flags,
            record.last_pushed,
        )
    };

    let Some(op) = op else {
        trace!(cap = %cap, "no commit callback, value bookkeeping only");
        return Ok(());
    };

    // volatile capabilities are edge-triggered (e.g. sync-frame requests):
    // the push itself is the signal, so equality never suppresses it
    if !flags.contains(CapabilityFlags::VOLATILE) && last_pushed == Some(value) {
        trace!(cap = %cap, value, "value already on device, push skipped");
        return Ok(());
    }

    {
        let ctx = CommitCtx {
            table,
            info,
            cap,
            value,
            device_id,
            flags,
        };
        op.commit(&ctx, transport)?;
    }

    table.get_mut(cap)?.last_pushed = Some(value);
    debug!(cap = %cap, value, "capability pushed to device");
    Ok(())
}

/// Drain the pending-commit set in dependency order.
///
/// The set is cleared unconditionally on success and discarded on failure;
/// it never survives the call.
pub(crate) fn commit_pending(
    table: &mut CapabilityTable,
    info: &SessionInfo,
    list: &DependencyList,
    pending: &mut CapabilitySet,
    transport: &mut dyn DeviceTransport,
) -> Result<()> {
    let mut outcome = Ok(());
    for cap in list.application_order() {
        if !pending.contains(cap) {
            continue;
        }
        if let Err(err) = commit_capability(table, info, cap, transport) {
            warn!(cap = %cap, error = %err, "commit drain aborted");
            outcome = Err(err);
            break;
        }
    }
    pending.clear();
    outcome
}

/// Full drain over every registered capability, in dependency order.
///
/// Used once at stream start to program the device with the statically
/// resolved configuration.
pub(crate) fn commit_all(
    table: &mut CapabilityTable,
    info: &SessionInfo,
    list: &DependencyList,
    transport: &mut dyn DeviceTransport,
) -> Result<()> {
    debug!("full commit pass over {} capabilities", list.len());
    for cap in list.application_order() {
        commit_capability(table, info, cap, transport)?;
    }
    Ok(())
}

//! Adjustment engine
//!
//! Two operating modes over the same registry:
//!
//! - **Static (full) adjustment** runs once, before the device session goes
//!   active: every capability in the cached dependency list is resolved in
//!   application order, in memory only. Nothing is pushed.
//! - **Dynamic (incremental) adjustment** runs once per client write after
//!   streaming has started: the written capability is re-resolved, and any
//!   resulting change propagates breadth-first through its declared
//!   children. Every touched capability lands in the pending-commit set;
//!   children are only revisited when their parent's resolved value
//!   actually changed, which keeps no-op writes from churning the device.
//!
//! Any callback failure aborts the whole pass; the caller discards the
//! pending sets, so a failed client write commits nothing.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::controls::deplist::DependencyList;
use crate::controls::registry::CapabilityTable;
use crate::controls::types::{
    CapabilityFlags, CapabilityId, CapabilitySet, SessionInfo,
};
use crate::error::{Error, Result};

// =============================================================================
// Adjust callback contract
// =============================================================================

/// Read-only view handed to adjust callbacks.
///
/// A callback may read its own capability's current value and the values of
/// the capabilities it declared as parents. It resolves exactly one value,
/// its own, which the engine writes back.
pub struct AdjustCtx<'a> {
    table: &'a CapabilityTable,
    info: &'a SessionInfo,
    cap: CapabilityId,
    current: i64,
    flags: CapabilityFlags,
}

impl<'a> AdjustCtx<'a> {
    /// Capability being resolved.
    pub fn cap(&self) -> CapabilityId {
        self.cap
    }

    /// Session facts (domain, codec, streaming phase, engine limits).
    pub fn info(&self) -> &SessionInfo {
        self.info
    }

    /// Current value of the capability being resolved.
    pub fn current(&self) -> i64 {
        self.current
    }

    /// Whether the client ever wrote this capability explicitly.
    pub fn client_set(&self) -> bool {
        self.flags.contains(CapabilityFlags::CLIENT_SET)
    }

    /// Value of a declared parent, or `None` when the parent is not
    /// registered for this session (optional input).
    ///
    /// Reading a registered capability that does not list the current one
    /// among its children is a template inconsistency and fails the pass.
    pub fn parent_opt(&self, parent: CapabilityId) -> Result<Option<i64>> {
        if !self.table.is_valid(parent) {
            return Ok(None);
        }
        let record = self.table.get(parent)?;
        if !record.children.contains(&self.cap) {
            return Err(Error::AdjustFailure {
                cap: self.cap,
                reason: format!("reads {parent} without a declared parent link"),
            });
        }
        Ok(Some(record.value))
    }

    /// Value of a declared parent that must be registered.
    pub fn parent(&self, parent: CapabilityId) -> Result<i64> {
        self.parent_opt(parent)?.ok_or_else(|| Error::AdjustFailure {
            cap: self.cap,
            reason: format!("required parent {parent} is not registered"),
        })
    }
}

/// Value-resolution policy for one capability kind.
///
/// Implementations declare, as static metadata, which capability ids they
/// read as parents; the declaration is validated against the registration
/// template when the dependency list is built.
pub trait AdjustOp: Send + Sync {
    /// Capability ids this policy reads besides its own.
    fn parents(&self) -> &'static [CapabilityId] {
        &[]
    }

    /// Resolve the capability's value from the session view.
    fn adjust(&self, ctx: &AdjustCtx<'_>) -> Result<i64>;
}

// =============================================================================
// Engine passes
// =============================================================================

/// Resolve one capability in place; returns whether the value changed.
///
/// A capability without an adjust callback keeps its current (client-set)
/// value verbatim.
fn adjust_capability(
    table: &mut CapabilityTable,
    info: &SessionInfo,
    cap: CapabilityId,
) -> Result<bool> {
    let (op, prev, flags) = {
        let record = table.get(cap)?;
        (record.adjust, record.value, record.flags)
    };

    let Some(op) = op else {
        return Ok(false);
    };

    let resolved = {
        let ctx = AdjustCtx {
            table,
            info,
            cap,
            current: prev,
            flags,
        };
        op.adjust(&ctx)?
    };
    table.set_value(cap, resolved)?;

    Ok(resolved != prev)
}

/// Static full-graph pass: resolve every capability in application order.
///
/// No device pushes happen here; a separate full commit drain follows at
/// stream start.
pub(crate) fn adjust_all(
    table: &mut CapabilityTable,
    info: &SessionInfo,
    list: &DependencyList,
) -> Result<()> {
    debug!("static adjustment pass over {} capabilities", list.len());
    for cap in list.application_order() {
        trace!(cap = %cap, "static adjust");
        adjust_capability(table, info, cap)?;
    }
    Ok(())
}

/// Dynamic incremental pass for a single client write.
///
/// `requested` is the normalized client value. Populates `pending` with
/// every capability whose resolved value must be considered for commit; the
/// caller drains it in dependency order. On error the caller discards
/// `pending` without committing anything.
pub(crate) fn adjust_dynamic(
    table: &mut CapabilityTable,
    info: &SessionInfo,
    cap: CapabilityId,
    requested: i64,
    pending: &mut CapabilitySet,
) -> Result<()> {
    let record = table.get(cap)?;
    if !record.flags.contains(CapabilityFlags::DYNAMIC) {
        return Err(Error::NotDynamicallyAdjustable(cap));
    }

    debug!(cap = %cap, requested, "dynamic adjustment");

    let prev = record.value;
    table.set_value(cap, requested)?;
    adjust_capability(table, info, cap)?;

    // The written capability is always considered for commit, even when the
    // resolved value is unchanged; the commit engine suppresses redundant
    // device pushes.
    pending.insert(cap);

    let mut revisit: VecDeque<CapabilityId> = VecDeque::new();
    let mut queued = CapabilitySet::new();

    if table.value(cap)? != prev {
        enqueue_children(table, cap, &mut revisit, &mut queued)?;
    }

    while let Some(child) = revisit.pop_front() {
        queued.remove(child);

        let child_prev = {
            let record = table.get(child)?;
            if record.adjust.is_none() {
                // Guaranteed by build-time graph validation; kept as a hard
                // failure so a broken table cannot half-propagate.
                return Err(Error::AdjustFailure {
                    cap: child,
                    reason: "child capability has no adjust callback".into(),
                });
            }
            record.value
        };

        adjust_capability(table, info, child)?;
        pending.insert(child);

        if table.value(child)? != child_prev {
            enqueue_children(table, child, &mut revisit, &mut queued)?;
        }
    }

    trace!(pending = pending.len(), "dynamic adjustment resolved");
    Ok(())
}

fn enqueue_children(
    table: &CapabilityTable,
    cap: CapabilityId,
    revisit: &mut VecDeque<CapabilityId>,
    queued: &mut CapabilitySet,
) -> Result<()> {
    for &child in table.get(cap)?.children {
        if queued.insert(child) {
            revisit.push_back(child);
        }
    }
    Ok(())
}

//! Codec session state and the client write API
//!
//! A session owns its capability registry, the lazily built dependency
//! list, and the transport to its device instance. All mutation funnels
//! through [`Session::set_control`]: before streaming the write is stored
//! and resolved later by the full pre-stream pass; after streaming it runs
//! the incremental adjustment cascade followed immediately by a
//! dependency-ordered commit drain.
//!
//! Sessions are not internally synchronized; the engine wraps each one in
//! its own mutex, and independent sessions never share state.

use tracing::{debug, info, trace};

use crate::controls::adjust;
use crate::controls::commit;
use crate::controls::deplist::DependencyList;
use crate::controls::query::{self, ControlDescriptor};
use crate::controls::registry::CapabilityTable;
use crate::controls::types::{
    Capability, CapabilityFlags, CapabilityId, CapabilitySet, Codec, Domain, SessionInfo,
};
use crate::engine::EngineShared;
use crate::error::{Error, Result};
use crate::platform::{self, SessionTemplate};
use crate::transport::DeviceTransport;
use std::sync::Arc;

/// Process-unique session identifier.
pub type SessionId = u64;

/// One hardware codec session's control state.
pub struct Session {
    id: SessionId,
    info: SessionInfo,
    table: CapabilityTable,
    dep_list: Option<DependencyList>,
    transport: Box<dyn DeviceTransport>,
    shared: Arc<EngineShared>,
    secure_acquired: bool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("info", &self.info)
            .field("secure_acquired", &self.secure_acquired)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Open a standalone session for a built-in (domain, codec) template.
    pub fn new(
        domain: Domain,
        codec: Codec,
        transport: Box<dyn DeviceTransport>,
    ) -> Result<Self> {
        let template = platform::template_for(domain, codec)
            .ok_or(Error::UnsupportedSession { domain, codec })?;
        Self::from_template(template, transport)
    }

    /// Open a standalone session from an explicit registration template.
    pub fn from_template(
        template: &'static SessionTemplate,
        transport: Box<dyn DeviceTransport>,
    ) -> Result<Self> {
        Self::create(0, template, transport, Arc::new(EngineShared::default()))
    }

    pub(crate) fn create(
        id: SessionId,
        template: &'static SessionTemplate,
        transport: Box<dyn DeviceTransport>,
        shared: Arc<EngineShared>,
    ) -> Result<Self> {
        let table = CapabilityTable::from_template(template.caps)?;
        let info = SessionInfo {
            domain: template.domain,
            codec: template.codec,
            streaming: false,
            limits: shared.config(),
        };
        info!(
            session = id,
            domain = %info.domain,
            codec = %info.codec,
            caps = table.len(),
            "session opened"
        );

        Ok(Self {
            id,
            info,
            table,
            dep_list: None,
            transport,
            shared,
            secure_acquired: false,
        })
    }

    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Session domain.
    pub fn domain(&self) -> Domain {
        self.info.domain
    }

    /// Session codec.
    pub fn codec(&self) -> Codec {
        self.info.codec
    }

    /// Whether the device session is actively processing data.
    pub fn is_streaming(&self) -> bool {
        self.info.streaming
    }

    // =========================================================================
    // Client write API
    // =========================================================================

    /// Write a control value.
    ///
    /// The value is normalized against the capability's bounds first
    /// (integer clamp and step rounding, menu-mask membership, bitmask
    /// masking). Before streaming the write is stored for the pre-stream
    /// resolution pass; after streaming it must target a dynamic
    /// capability and triggers the incremental cascade plus a commit
    /// drain.
    pub fn set_control(&mut self, cap: CapabilityId, value: i64) -> Result<()> {
        let normalized = normalize_value(self.table.get(cap)?, value)?;
        debug!(
            session = self.id,
            cap = %cap,
            value,
            normalized,
            streaming = self.info.streaming,
            "client write"
        );

        self.table.set_flags(cap, CapabilityFlags::CLIENT_SET)?;

        if self.info.streaming {
            self.update_dynamic_property(cap, normalized)
        } else {
            self.update_static_property(cap, normalized)
        }
    }

    /// Read back a control's current resolved value.
    pub fn control(&self, cap: CapabilityId) -> Result<i64> {
        let record = self.table.get(cap)?;
        if record.flags.contains(CapabilityFlags::VOLATILE) {
            trace!(session = self.id, cap = %cap, value = record.value, "volatile read");
        }
        Ok(record.value)
    }

    /// Enumerate the session's control surface.
    pub fn query_controls(&self) -> Vec<ControlDescriptor> {
        query::describe(&self.table, self.info.codec)
    }

    /// Menu item names for a registered menu control.
    pub fn query_menu(&self, cap: CapabilityId) -> Result<Option<&'static [&'static str]>> {
        self.table.get(cap)?;
        Ok(query::menu_items(self.info.codec, cap))
    }

    // =========================================================================
    // Streaming transitions
    // =========================================================================

    /// Resolve and program the full configuration, then mark the session
    /// streaming.
    ///
    /// Builds the dependency list on first use (it is cached for the
    /// session's lifetime), runs the full static adjustment pass, and
    /// pushes every capability with a commit callback, in dependency
    /// order.
    pub fn start_streaming(&mut self) -> Result<()> {
        if self.info.streaming {
            debug!(session = self.id, "already streaming");
            return Ok(());
        }

        if self.dep_list.is_none() {
            self.dep_list = Some(DependencyList::build(&self.table)?);
        }
        let list = self
            .dep_list
            .as_ref()
            .ok_or_else(|| Error::InvalidGraph("dependency list missing".into()))?;

        adjust::adjust_all(&mut self.table, &self.info, list)?;
        commit::commit_all(&mut self.table, &self.info, list, &mut *self.transport)?;

        self.info.streaming = true;
        info!(session = self.id, "streaming started");
        Ok(())
    }

    /// Mark the session stopped; subsequent writes are static again.
    pub fn stop_streaming(&mut self) {
        if self.info.streaming {
            self.info.streaming = false;
            info!(session = self.id, "streaming stopped");
        }
    }

    // =========================================================================
    // Phase-specific write handling
    // =========================================================================

    /// Pre-streaming write: store the value and apply the handful of
    /// immediate side effects that cannot wait for the pre-stream pass.
    fn update_static_property(&mut self, cap: CapabilityId, value: i64) -> Result<()> {
        if cap == CapabilityId::SecureMode {
            self.apply_secure_transition(value)?;
        }

        self.table.set_value(cap, value)?;

        // a critical session pins the scheduling priority to the top slot
        if cap == CapabilityId::CriticalPriority
            && value != 0
            && self.table.is_valid(CapabilityId::Priority)
        {
            self.table.set_value(CapabilityId::Priority, 0)?;
        }

        Ok(())
    }

    /// Post-streaming write: incremental cascade, then drain the pending
    /// set in dependency order. A failure discards the pending state
    /// without touching the device further.
    fn update_dynamic_property(&mut self, cap: CapabilityId, value: i64) -> Result<()> {
        let list = self
            .dep_list
            .as_ref()
            .ok_or_else(|| Error::InvalidGraph("dependency list missing".into()))?;

        let mut pending = CapabilitySet::new();
        adjust::adjust_dynamic(&mut self.table, &self.info, cap, value, &mut pending)?;
        commit::commit_pending(
            &mut self.table,
            &self.info,
            list,
            &mut pending,
            &mut *self.transport,
        )
    }

    /// Secure-session accounting against the engine-wide limit.
    ///
    /// Runs before the value lands so a denied enable leaves the session
    /// untouched.
    fn apply_secure_transition(&mut self, new_value: i64) -> Result<()> {
        let enabled = self.table.value(CapabilityId::SecureMode)? != 0;
        if new_value != 0 && !enabled && !self.secure_acquired {
            self.shared.acquire_secure()?;
            self.secure_acquired = true;
        } else if new_value == 0 && self.secure_acquired {
            self.shared.release_secure();
            self.secure_acquired = false;
        }
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.secure_acquired {
            self.shared.release_secure();
        }
        debug!(session = self.id, "session closed");
    }
}

// =============================================================================
// Value normalization
// =============================================================================

/// Normalize a raw client value against a capability's bounds.
///
/// Menu values must be a permitted item; bitmask values are masked down to
/// the permitted bits; integers clamp to the range and round to the
/// nearest step.
fn normalize_value(cap: &Capability, value: i64) -> Result<i64> {
    if cap.flags.contains(CapabilityFlags::MENU) {
        let permitted = (0..64).contains(&value)
            && value >= cap.min
            && value <= cap.max
            && (cap.step_or_mask >> value) & 1 == 1;
        if !permitted {
            return Err(Error::InvalidValue { cap: cap.id, value });
        }
        return Ok(value);
    }

    if cap.flags.contains(CapabilityFlags::BITMASK) {
        if value < 0 {
            return Err(Error::InvalidValue { cap: cap.id, value });
        }
        return Ok(((value as u64) & cap.step_or_mask) as i64);
    }

    let mut v = value.clamp(cap.min, cap.max);
    let step = cap.step_or_mask as i64;
    if step > 1 {
        v = cap.min + (v - cap.min + step / 2) / step * step;
        v = v.clamp(cap.min, cap.max);
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::values;
    use crate::transport::{DeviceProperty, TransportError};

    struct NullTransport;

    impl DeviceTransport for NullTransport {
        fn push_property(
            &mut self,
            _prop: DeviceProperty,
        ) -> std::result::Result<(), TransportError> {
            Ok(())
        }
    }

    fn encoder() -> Session {
        Session::new(Domain::Encoder, Codec::H264, Box::new(NullTransport)).unwrap()
    }

    #[test]
    fn test_unsupported_session_type() {
        let err =
            Session::new(Domain::Decoder, Codec::Av1, Box::new(NullTransport)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedSession { .. }));
    }

    #[test]
    fn test_unregistered_write_mutates_nothing() {
        let mut session = encoder();
        let before: Vec<i64> = CapabilityId::ALL
            .iter()
            .filter_map(|&id| session.control(id).ok())
            .collect();

        let err = session.set_control(CapabilityId::OutputOrder, 1).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidCapability(CapabilityId::OutputOrder)
        ));

        let after: Vec<i64> = CapabilityId::ALL
            .iter()
            .filter_map(|&id| session.control(id).ok())
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_menu_value_outside_mask_rejected() {
        let mut session = encoder();
        // extended profile is carved out of the permitted-item mask
        let err = session
            .set_control(CapabilityId::Profile, values::H264_PROFILE_EXTENDED)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));
    }

    #[test]
    fn test_integer_write_clamps_and_steps() {
        let mut session = encoder();
        session.set_control(CapabilityId::FrameWidth, 1923).unwrap();
        assert_eq!(session.control(CapabilityId::FrameWidth).unwrap(), 1924);

        session.set_control(CapabilityId::Bitrate, 999_999_999).unwrap();
        assert_eq!(session.control(CapabilityId::Bitrate).unwrap(), 245_000_000);
    }

    #[test]
    fn test_bitmask_write_masks_unsupported_bits() {
        let mut session = encoder();
        session.set_control(CapabilityId::UseLtr, 0b1110).unwrap();
        assert_eq!(session.control(CapabilityId::UseLtr).unwrap(), 0b10);
    }

    #[test]
    fn test_critical_priority_pins_priority() {
        let mut session = encoder();
        session.set_control(CapabilityId::Priority, 3).unwrap();
        session.set_control(CapabilityId::CriticalPriority, 1).unwrap();
        assert_eq!(session.control(CapabilityId::Priority).unwrap(), 0);
    }

    #[test]
    fn test_static_write_then_stream_then_dynamic_gate() {
        let mut session = encoder();
        session
            .set_control(CapabilityId::BitrateMode, values::RC_CBR)
            .unwrap();
        session.start_streaming().unwrap();
        assert!(session.is_streaming());

        // bitrate is dynamic, bitrate mode is not
        session.set_control(CapabilityId::Bitrate, 6_000_000).unwrap();
        let err = session
            .set_control(CapabilityId::BitrateMode, values::RC_VBR)
            .unwrap_err();
        assert!(matches!(err, Error::NotDynamicallyAdjustable(_)));
    }
}

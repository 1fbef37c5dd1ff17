//! Capability registry
//!
//! Static-per-session table of capability records, seeded once from the
//! registration template for the session's (domain, codec) pair and torn
//! down with the session. Unregistered ids are rejected at every boundary;
//! the registry itself never invokes callbacks.

use tracing::{debug, trace};

use crate::controls::types::{Capability, CapabilityFlags, CapabilityId};
use crate::error::{Error, Result};
use crate::platform::CapabilitySpec;

/// Per-session capability table, indexed by [`CapabilityId`].
pub struct CapabilityTable {
    slots: [Option<Capability>; CapabilityId::COUNT],
}

impl CapabilityTable {
    /// Seed a table from a registration template.
    ///
    /// Fails with [`Error::InvalidGraph`] on duplicate rows; deeper graph
    /// validation happens when the dependency list is built.
    pub fn from_template(rows: &'static [CapabilitySpec]) -> Result<Self> {
        let mut slots: [Option<Capability>; CapabilityId::COUNT] =
            std::array::from_fn(|_| None);

        for row in rows {
            let slot = &mut slots[row.id.index()];
            if slot.is_some() {
                return Err(Error::InvalidGraph(format!(
                    "duplicate template row for {}",
                    row.id
                )));
            }
            *slot = Some(row.instantiate());
            trace!(cap = %row.id, default = row.default, "registered capability");
        }

        Ok(Self { slots })
    }

    /// Whether `id` is registered for this session.
    pub fn is_valid(&self, id: CapabilityId) -> bool {
        self.slots[id.index()].is_some()
    }

    /// Borrow a capability record.
    pub fn get(&self, id: CapabilityId) -> Result<&Capability> {
        self.slots[id.index()]
            .as_ref()
            .ok_or(Error::InvalidCapability(id))
    }

    /// Mutably borrow a capability record.
    pub(crate) fn get_mut(&mut self, id: CapabilityId) -> Result<&mut Capability> {
        self.slots[id.index()]
            .as_mut()
            .ok_or(Error::InvalidCapability(id))
    }

    /// Current resolved value of `id`.
    pub fn value(&self, id: CapabilityId) -> Result<i64> {
        Ok(self.get(id)?.value)
    }

    /// Direct, unconditional value write. No callbacks run.
    pub(crate) fn set_value(&mut self, id: CapabilityId, value: i64) -> Result<()> {
        let cap = self.get_mut(id)?;
        if cap.value != value {
            debug!(cap = %id, from = cap.value, to = value, "capability value updated");
        }
        cap.value = value;
        Ok(())
    }

    /// Set flags on a capability.
    pub(crate) fn set_flags(&mut self, id: CapabilityId, flags: CapabilityFlags) -> Result<()> {
        self.get_mut(id)?.flags |= flags;
        Ok(())
    }

    /// Iterate registered capabilities in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Capability> {
        self.slots.iter().filter_map(|slot| slot.as_ref())
    }

    /// Number of registered capabilities.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Whether the table registered nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform;
    use crate::controls::types::{Codec, Domain};

    fn h264_encoder_table() -> CapabilityTable {
        let template = platform::template_for(Domain::Encoder, Codec::H264).unwrap();
        CapabilityTable::from_template(template.caps).unwrap()
    }

    #[test]
    fn test_unregistered_id_rejected() {
        let table = h264_encoder_table();
        // decoder-only capability on an encoder session
        let err = table.get(CapabilityId::OutputOrder).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidCapability(CapabilityId::OutputOrder)
        ));
        assert!(!table.is_valid(CapabilityId::OutputOrder));
    }

    #[test]
    fn test_set_value_is_direct() {
        let mut table = h264_encoder_table();
        table.set_value(CapabilityId::Bitrate, 4_000_000).unwrap();
        assert_eq!(table.value(CapabilityId::Bitrate).unwrap(), 4_000_000);
    }

    #[test]
    fn test_template_defaults_applied() {
        let table = h264_encoder_table();
        let cap = table.get(CapabilityId::BitrateMode).unwrap();
        assert!(cap.flags.contains(CapabilityFlags::MENU));
        assert_eq!(cap.value, cap.min.max(cap.value));
    }
}

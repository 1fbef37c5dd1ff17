//! Client-visible control surface
//!
//! Builds serializable descriptors for every capability a session exposes:
//! integer controls carry their range and step, menu controls their
//! permitted-item mask and human-readable item names, bitmask controls
//! their permitted bits. Clients enumerate these to discover what the
//! session supports before writing anything.

use serde::Serialize;

use crate::controls::registry::CapabilityTable;
use crate::controls::types::{CapabilityFlags, CapabilityId, Codec};

/// Value semantics of one control.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlKind {
    /// Plain integer with an inclusive range and step
    Integer {
        /// Lower bound
        min: i64,
        /// Upper bound
        max: i64,
        /// Step size
        step: u64,
    },
    /// Menu of named items; bit `i` of `mask` permits item `i`
    Menu {
        /// Permitted-item mask
        mask: u64,
        /// Item names indexed by menu value
        items: Vec<&'static str>,
    },
    /// Bitmask value; only bits in `mask` are accepted
    Bitmask {
        /// Permitted bits
        mask: u64,
    },
}

/// One entry of the enumerable control surface.
#[derive(Debug, Clone, Serialize)]
pub struct ControlDescriptor {
    /// Capability behind this control
    pub cap: CapabilityId,
    /// Stable control name
    pub name: &'static str,
    /// Value semantics
    pub kind: ControlKind,
    /// Current resolved value
    pub current: i64,
    /// Template default
    pub default: i64,
    /// Value may change without a client write; read back fresh
    pub volatile: bool,
    /// Writable after streaming starts
    pub dynamic: bool,
}

/// Menu item names for a capability, per codec.
///
/// Returns `None` for capabilities without menu semantics.
pub fn menu_items(codec: Codec, cap: CapabilityId) -> Option<&'static [&'static str]> {
    match cap {
        CapabilityId::BitrateMode => Some(&[
            "Variable Bitrate",
            "Constant Bitrate",
            "Constant Quality",
        ]),
        CapabilityId::EntropyMode => Some(&["CAVLC", "CABAC"]),
        CapabilityId::Profile => match codec {
            Codec::H264 => Some(&[
                "Baseline",
                "Constrained Baseline",
                "Main",
                "Extended",
                "High",
            ]),
            Codec::Hevc => Some(&[
                "Main",
                "Main Still Picture",
                "Main 10",
                "Main 10 Still Picture",
            ]),
            Codec::Av1 => Some(&["Main", "High", "Professional"]),
            Codec::Vp9 => None,
        },
        CapabilityId::Level => match codec {
            Codec::H264 => Some(&[
                "1.0", "1b", "1.1", "1.2", "1.3", "2.0", "2.1", "2.2", "3.0", "3.1",
                "3.2", "4.0", "4.1", "4.2", "5.0", "5.1",
            ]),
            Codec::Hevc => Some(&[
                "1", "2", "2.1", "3", "3.1", "4", "4.1", "5", "5.1", "5.2", "6",
                "6.1", "6.2",
            ]),
            Codec::Av1 => Some(&[
                "2.0", "2.1", "2.2", "2.3", "3.0", "3.1", "3.2", "3.3", "4.0", "4.1",
                "4.2", "4.3", "5.0", "5.1", "5.2", "5.3", "6.0", "6.1", "6.2", "6.3",
                "7.0", "7.1", "7.2", "7.3",
            ]),
            Codec::Vp9 => None,
        },
        _ => None,
    }
}

/// Build the descriptor list for a populated registry.
pub(crate) fn describe(table: &CapabilityTable, codec: Codec) -> Vec<ControlDescriptor> {
    table
        .iter()
        .map(|cap| {
            let kind = if cap.flags.contains(CapabilityFlags::MENU) {
                ControlKind::Menu {
                    mask: cap.step_or_mask,
                    items: menu_items(codec, cap.id)
                        .map(|items| items.to_vec())
                        .unwrap_or_default(),
                }
            } else if cap.flags.contains(CapabilityFlags::BITMASK) {
                ControlKind::Bitmask {
                    mask: cap.step_or_mask,
                }
            } else {
                ControlKind::Integer {
                    min: cap.min,
                    max: cap.max,
                    step: cap.step_or_mask,
                }
            };

            ControlDescriptor {
                cap: cap.id,
                name: cap.id.name(),
                kind,
                current: cap.value,
                default: cap.default,
                volatile: cap.flags.contains(CapabilityFlags::VOLATILE),
                dynamic: cap.flags.contains(CapabilityFlags::DYNAMIC),
            }
        })
        .collect()
}

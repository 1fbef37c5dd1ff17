//! Capability data model
//!
//! A codec session negotiates a set of interdependent runtime controls
//! ("capabilities"): resolution, bitrate, profile, quality modes, layering,
//! low-latency mode, and so on. Each capability carries its current value,
//! its legal range, semantic flags, the set of capabilities that must be
//! re-adjusted when its resolved value changes, and optional adjust/commit
//! callbacks supplied by the registration template.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::controls::adjust::AdjustOp;
use crate::controls::commit::CommitOp;
use crate::engine::EngineConfig;

// =============================================================================
// Session classification
// =============================================================================

/// Session domain: which direction the codec pipeline runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// Compressed bitstream out
    Encoder,
    /// Compressed bitstream in
    Decoder,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Encoder => write!(f, "encoder"),
            Domain::Decoder => write!(f, "decoder"),
        }
    }
}

/// Codec the session is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    /// H.264 / AVC
    H264,
    /// H.265 / HEVC
    Hevc,
    /// VP9
    Vp9,
    /// AV1
    Av1,
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Codec::H264 => write!(f, "h264"),
            Codec::Hevc => write!(f, "hevc"),
            Codec::Vp9 => write!(f, "vp9"),
            Codec::Av1 => write!(f, "av1"),
        }
    }
}

// =============================================================================
// Capability identifiers
// =============================================================================

/// Stable identifier for one capability, unique within a session.
///
/// The id doubles as the index into the session's capability table and into
/// [`CapabilitySet`] bitsets, so the discriminants are explicit and dense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum CapabilityId {
    /// Coded frame width in pixels
    FrameWidth = 0,
    /// Coded frame height in pixels
    FrameHeight = 1,
    /// Frames per second
    FrameRate = 2,
    /// Rate-control mode (menu: VBR / CBR / CQ)
    BitrateMode = 3,
    /// Average bitrate in bits per second
    Bitrate = 4,
    /// Constant-quality target, used only by CQ rate control
    ConstantQuality = 5,
    /// Codec profile (menu, per-codec item set)
    Profile = 6,
    /// Codec level (menu, per-codec item set)
    Level = 7,
    /// H.264 entropy coding mode (menu: CAVLC / CABAC)
    EntropyMode = 8,
    /// H.264 8x8 transform enable
    Transform8x8 = 9,
    /// Keyframe interval in frames; 0 means a single open GOP
    GopSize = 10,
    /// Number of B frames per sub-GOP
    BFrames = 11,
    /// All-intra coding (derived: every frame is a keyframe)
    AllIntra = 12,
    /// Number of long-term reference frames
    LtrCount = 13,
    /// Bitmask of LTR slots to reference
    UseLtr = 14,
    /// LTR slot index to mark with the next frame
    MarkLtr = 15,
    /// Intra-refresh period in frames; 0 disables periodic refresh
    IrPeriod = 16,
    /// Peak bitrate for CBR rate control
    PeakBitrate = 17,
    /// Minimum-quality enforcement for VBR rate control
    MinQuality = 18,
    /// Percentage bitrate boost allowed above average for VBR
    BitrateBoost = 19,
    /// Low-latency mode
    LowLatency = 20,
    /// Number of enhancement layers for layered encoding
    EnhLayerCount = 21,
    /// One-shot sync-frame (keyframe) request
    RequestSyncFrame = 22,
    /// Session priority: 0 realtime, 1..4 background tiers
    Priority = 23,
    /// Marks the session critical, overriding [`CapabilityId::Priority`]
    CriticalPriority = 24,
    /// Secure (protected-memory) session
    SecureMode = 25,
    /// Decoder output order: 0 display order, 1 decode order
    OutputOrder = 26,
    /// Decoder thumbnail mode: decode a single representative frame
    ThumbnailMode = 27,
}

impl CapabilityId {
    /// Number of distinct capability ids.
    pub const COUNT: usize = 28;

    /// Every capability id, in discriminant order.
    pub const ALL: [CapabilityId; CapabilityId::COUNT] = [
        CapabilityId::FrameWidth,
        CapabilityId::FrameHeight,
        CapabilityId::FrameRate,
        CapabilityId::BitrateMode,
        CapabilityId::Bitrate,
        CapabilityId::ConstantQuality,
        CapabilityId::Profile,
        CapabilityId::Level,
        CapabilityId::EntropyMode,
        CapabilityId::Transform8x8,
        CapabilityId::GopSize,
        CapabilityId::BFrames,
        CapabilityId::AllIntra,
        CapabilityId::LtrCount,
        CapabilityId::UseLtr,
        CapabilityId::MarkLtr,
        CapabilityId::IrPeriod,
        CapabilityId::PeakBitrate,
        CapabilityId::MinQuality,
        CapabilityId::BitrateBoost,
        CapabilityId::LowLatency,
        CapabilityId::EnhLayerCount,
        CapabilityId::RequestSyncFrame,
        CapabilityId::Priority,
        CapabilityId::CriticalPriority,
        CapabilityId::SecureMode,
        CapabilityId::OutputOrder,
        CapabilityId::ThumbnailMode,
    ];

    /// Table/bitset index for this id.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable name used in logs and descriptors.
    pub fn name(self) -> &'static str {
        match self {
            CapabilityId::FrameWidth => "frame_width",
            CapabilityId::FrameHeight => "frame_height",
            CapabilityId::FrameRate => "frame_rate",
            CapabilityId::BitrateMode => "bitrate_mode",
            CapabilityId::Bitrate => "bitrate",
            CapabilityId::ConstantQuality => "constant_quality",
            CapabilityId::Profile => "profile",
            CapabilityId::Level => "level",
            CapabilityId::EntropyMode => "entropy_mode",
            CapabilityId::Transform8x8 => "transform_8x8",
            CapabilityId::GopSize => "gop_size",
            CapabilityId::BFrames => "b_frames",
            CapabilityId::AllIntra => "all_intra",
            CapabilityId::LtrCount => "ltr_count",
            CapabilityId::UseLtr => "use_ltr",
            CapabilityId::MarkLtr => "mark_ltr",
            CapabilityId::IrPeriod => "ir_period",
            CapabilityId::PeakBitrate => "peak_bitrate",
            CapabilityId::MinQuality => "min_quality",
            CapabilityId::BitrateBoost => "bitrate_boost",
            CapabilityId::LowLatency => "low_latency",
            CapabilityId::EnhLayerCount => "enh_layer_count",
            CapabilityId::RequestSyncFrame => "request_sync_frame",
            CapabilityId::Priority => "priority",
            CapabilityId::CriticalPriority => "critical_priority",
            CapabilityId::SecureMode => "secure_mode",
            CapabilityId::OutputOrder => "output_order",
            CapabilityId::ThumbnailMode => "thumbnail_mode",
        }
    }
}

impl fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Capability flags
// =============================================================================

bitflags::bitflags! {
    /// Semantic flags attached to a capability.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CapabilityFlags: u32 {
        /// The client has explicitly written this capability
        const CLIENT_SET = 1 << 0;
        /// Writable after streaming has started
        const DYNAMIC = 1 << 1;
        /// Value may change behind the client's back; read back fresh
        const VOLATILE = 1 << 2;
        /// `step_or_mask` is a bitmask of permitted value bits
        const BITMASK = 1 << 3;
        /// Value is a menu index; `step_or_mask` is the permitted-item mask
        const MENU = 1 << 4;
        /// Property routes to the device input port
        const INPUT_PORT = 1 << 5;
        /// Property routes to the device output port
        const OUTPUT_PORT = 1 << 6;
    }
}

// =============================================================================
// Capability record
// =============================================================================

/// One capability as held in the session's registry.
///
/// `children` is the bounded, ordered set of capability ids that must be
/// re-adjusted whenever this capability's resolved value changes. The
/// callbacks come from the static registration template; a capability with
/// neither callback is a pure pass-through leaf and must declare no
/// children.
pub struct Capability {
    /// Stable identifier
    pub id: CapabilityId,
    /// Lower bound (integer semantics) or lowest menu index
    pub min: i64,
    /// Upper bound or highest menu index
    pub max: i64,
    /// Step size, or permitted-bit mask for menu/bitmask capabilities
    pub step_or_mask: u64,
    /// Current resolved value
    pub value: i64,
    /// Template default, before any client write
    pub default: i64,
    /// Semantic flags
    pub flags: CapabilityFlags,
    /// Device-side property identifier; 0 when nothing is pushed
    pub device_id: u32,
    /// Capabilities re-adjusted when this one's resolved value changes
    pub children: &'static [CapabilityId],
    /// Optional value-resolution callback
    pub adjust: Option<&'static dyn AdjustOp>,
    /// Optional device-push callback
    pub commit: Option<&'static dyn CommitOp>,
    /// Last value successfully pushed to the device, if any
    pub(crate) last_pushed: Option<i64>,
}

impl Capability {
    /// Whether any capability depends on this one.
    #[inline]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Leaf capabilities influence nothing else.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("id", &self.id)
            .field("value", &self.value)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("step_or_mask", &self.step_or_mask)
            .field("flags", &self.flags)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Session view shared with callbacks
// =============================================================================

/// Immutable session facts exposed to adjust/commit callbacks.
#[derive(Debug, Clone, Copy)]
pub struct SessionInfo {
    /// Session domain
    pub domain: Domain,
    /// Session codec
    pub codec: Codec,
    /// Whether the device session is actively processing data
    pub streaming: bool,
    /// Engine-wide limits consulted by capability policies
    pub limits: EngineConfig,
}

// =============================================================================
// Capability id sets
// =============================================================================

const SET_WORDS: usize = (CapabilityId::COUNT + 63) / 64;

/// Fixed-width bitset keyed by capability id.
///
/// Used for the transient pending-commit and children-revisit bookkeeping
/// inside one adjustment pass; sized to the capability id space so no
/// allocation happens per pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    words: [u64; SET_WORDS],
}

impl CapabilitySet {
    /// Empty set.
    pub const fn new() -> Self {
        Self {
            words: [0; SET_WORDS],
        }
    }

    /// Insert an id; returns whether it was newly added.
    pub fn insert(&mut self, id: CapabilityId) -> bool {
        let (w, b) = (id.index() / 64, id.index() % 64);
        let fresh = self.words[w] & (1 << b) == 0;
        self.words[w] |= 1 << b;
        fresh
    }

    /// Remove an id; returns whether it was present.
    pub fn remove(&mut self, id: CapabilityId) -> bool {
        let (w, b) = (id.index() / 64, id.index() % 64);
        let present = self.words[w] & (1 << b) != 0;
        self.words[w] &= !(1 << b);
        present
    }

    /// Membership test.
    pub fn contains(&self, id: CapabilityId) -> bool {
        let (w, b) = (id.index() / 64, id.index() % 64);
        self.words[w] & (1 << b) != 0
    }

    /// Number of ids in the set.
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// Drop all ids.
    pub fn clear(&mut self) {
        self.words = [0; SET_WORDS];
    }

    /// Iterate members in id order.
    pub fn iter(&self) -> impl Iterator<Item = CapabilityId> + '_ {
        CapabilityId::ALL.iter().copied().filter(|id| self.contains(*id))
    }
}

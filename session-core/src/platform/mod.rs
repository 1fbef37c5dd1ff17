//! Registration templates and capability policies
//!
//! A session's capability registry is seeded from a static template keyed
//! by (domain, codec). Templates carry the bounds, defaults, flags, device
//! property ids, the dependency edges, and the adjust/commit policies for
//! every capability the session exposes. Configuration loading picks the
//! template; the engine never mutates one.

pub mod ops;
mod tables;

use crate::controls::adjust::AdjustOp;
use crate::controls::commit::CommitOp;
use crate::controls::types::{Capability, CapabilityFlags, CapabilityId, Codec, Domain};

pub use tables::{DECODER_H264, ENCODER_H264, ENCODER_HEVC};

/// Client-side value constants shared by capability policies.
pub mod values {
    /// Variable bitrate (menu index)
    pub const RC_VBR: i64 = 0;
    /// Constant bitrate (menu index)
    pub const RC_CBR: i64 = 1;
    /// Constant quality (menu index)
    pub const RC_CQ: i64 = 2;

    /// CAVLC entropy coding (menu index)
    pub const ENTROPY_CAVLC: i64 = 0;
    /// CABAC entropy coding (menu index)
    pub const ENTROPY_CABAC: i64 = 1;

    /// H.264 Baseline profile (menu index)
    pub const H264_PROFILE_BASELINE: i64 = 0;
    /// H.264 Constrained Baseline profile (menu index)
    pub const H264_PROFILE_CONSTRAINED_BASELINE: i64 = 1;
    /// H.264 Main profile (menu index)
    pub const H264_PROFILE_MAIN: i64 = 2;
    /// H.264 Extended profile (menu index)
    pub const H264_PROFILE_EXTENDED: i64 = 3;
    /// H.264 High profile (menu index)
    pub const H264_PROFILE_HIGH: i64 = 4;

    /// HEVC Main profile (menu index)
    pub const HEVC_PROFILE_MAIN: i64 = 0;
    /// HEVC Main Still Picture profile (menu index)
    pub const HEVC_PROFILE_MAIN_STILL: i64 = 1;
    /// HEVC Main 10 profile (menu index)
    pub const HEVC_PROFILE_MAIN_10: i64 = 2;
    /// HEVC Main 10 Still Picture profile (menu index)
    pub const HEVC_PROFILE_MAIN_10_STILL: i64 = 3;

    /// Decoder delivers frames in display order
    pub const OUTPUT_ORDER_DISPLAY: i64 = 0;
    /// Decoder delivers frames in decode order
    pub const OUTPUT_ORDER_DECODE: i64 = 1;

    /// Hardware cap on B frames per sub-GOP
    pub const MAX_BFRAMES: i64 = 7;
    /// Hardware cap on reference frames shared by LTR and layering
    pub const MAX_ENC_REFERENCE_FRAMES: i64 = 7;
    /// Largest VBR bitrate boost percentage
    pub const MAX_BITRATE_BOOST: i64 = 25;
    /// Offset added to client priorities before they reach firmware;
    /// slot 0 stays reserved for critical sessions
    pub const FIRMWARE_PRIORITY_OFFSET: i64 = 1;
}

/// Device-side property identifiers.
pub mod props {
    /// Frame rate property
    pub const FRAME_RATE: u32 = 0x0300_0001;
    /// Rate-control mode property
    pub const RATE_CONTROL: u32 = 0x0300_0002;
    /// Average bitrate property
    pub const BITRATE: u32 = 0x0300_0003;
    /// Constant-quality target property
    pub const CONSTANT_QUALITY: u32 = 0x0300_0004;
    /// Profile property
    pub const PROFILE: u32 = 0x0300_0005;
    /// Level property
    pub const LEVEL: u32 = 0x0300_0006;
    /// Entropy mode property
    pub const ENTROPY_MODE: u32 = 0x0300_0007;
    /// 8x8 transform property
    pub const TRANSFORM_8X8: u32 = 0x0300_0008;
    /// GOP size property
    pub const GOP_SIZE: u32 = 0x0300_0009;
    /// Max B frames property
    pub const MAX_B_FRAMES: u32 = 0x0300_000a;
    /// LTR slot count property
    pub const LTR_COUNT: u32 = 0x0300_000b;
    /// LTR reference mask property
    pub const USE_LTR: u32 = 0x0300_000c;
    /// LTR mark index property
    pub const MARK_LTR: u32 = 0x0300_000d;
    /// Intra-refresh period property
    pub const IR_PERIOD: u32 = 0x0300_000e;
    /// Peak bitrate property
    pub const PEAK_BITRATE: u32 = 0x0300_000f;
    /// Minimum-quality property
    pub const MIN_QUALITY: u32 = 0x0300_0010;
    /// Bitrate boost property
    pub const BITRATE_BOOST: u32 = 0x0300_0011;
    /// Low-latency property
    pub const LOW_LATENCY: u32 = 0x0300_0012;
    /// Layer structure property
    pub const LAYER_INFO: u32 = 0x0300_0013;
    /// Sync-frame request property
    pub const REQUEST_SYNC_FRAME: u32 = 0x0300_0014;
    /// Session priority property
    pub const SESSION_PRIORITY: u32 = 0x0300_0015;
    /// Decoder output order property
    pub const OUTPUT_ORDER: u32 = 0x0300_0016;
    /// Thumbnail mode property
    pub const THUMBNAIL_MODE: u32 = 0x0300_0017;
}

/// Device-side enumerants.
pub mod dev {
    /// Variable bitrate, constant frame rate
    pub const RC_VBR_CFR: u32 = 0;
    /// Constant bitrate, constant frame rate
    pub const RC_CBR_CFR: u32 = 1;
    /// Constant bitrate, variable frame rate
    pub const RC_CBR_VFR: u32 = 2;
    /// Constant quality
    pub const RC_CQ: u32 = 3;

    /// CAVLC entropy coding
    pub const ENTROPY_CAVLC: u32 = 0;
    /// CABAC entropy coding
    pub const ENTROPY_CABAC: u32 = 1;

    /// P-pyramid layer hierarchy
    pub const HIER_P: u32 = 1;
}

/// One template row: everything needed to seed a capability record.
pub struct CapabilitySpec {
    /// Capability this row describes
    pub id: CapabilityId,
    /// Lower bound or lowest menu index
    pub min: i64,
    /// Upper bound or highest menu index
    pub max: i64,
    /// Step size, or permitted-bit mask for menu/bitmask capabilities
    pub step_or_mask: u64,
    /// Default value before any client write
    pub default: i64,
    /// Semantic flags
    pub flags: CapabilityFlags,
    /// Device-side property id; 0 when the capability is never pushed
    pub device_id: u32,
    /// Capabilities re-adjusted when this one's resolved value changes
    pub children: &'static [CapabilityId],
    /// Value-resolution policy
    pub adjust: Option<&'static dyn AdjustOp>,
    /// Device-push policy
    pub commit: Option<&'static dyn CommitOp>,
}

impl CapabilitySpec {
    /// Materialize the session-local record for this row.
    pub(crate) fn instantiate(&self) -> Capability {
        Capability {
            id: self.id,
            min: self.min,
            max: self.max,
            step_or_mask: self.step_or_mask,
            value: self.default,
            default: self.default,
            flags: self.flags,
            device_id: self.device_id,
            children: self.children,
            adjust: self.adjust,
            commit: self.commit,
            last_pushed: None,
        }
    }
}

/// Static capability database for one (domain, codec) pair.
pub struct SessionTemplate {
    /// Session domain this template serves
    pub domain: Domain,
    /// Codec this template serves
    pub codec: Codec,
    /// Template rows
    pub caps: &'static [CapabilitySpec],
}

/// Look up the built-in template for a session type.
pub fn template_for(domain: Domain, codec: Codec) -> Option<&'static SessionTemplate> {
    match (domain, codec) {
        (Domain::Encoder, Codec::H264) => Some(&ENCODER_H264),
        (Domain::Encoder, Codec::Hevc) => Some(&ENCODER_HEVC),
        (Domain::Decoder, Codec::H264) => Some(&DECODER_H264),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::deplist::DependencyList;
    use crate::controls::registry::CapabilityTable;

    #[test]
    fn test_builtin_templates_build_clean() {
        for template in [&ENCODER_H264, &ENCODER_HEVC, &DECODER_H264] {
            let table = CapabilityTable::from_template(template.caps)
                .unwrap_or_else(|e| panic!("{} {}: {e}", template.domain, template.codec));
            DependencyList::build(&table)
                .unwrap_or_else(|e| panic!("{} {}: {e}", template.domain, template.codec));
        }
    }

    #[test]
    fn test_unsupported_pairs_have_no_template() {
        assert!(template_for(Domain::Encoder, Codec::Av1).is_none());
        assert!(template_for(Domain::Decoder, Codec::Vp9).is_none());
    }
}

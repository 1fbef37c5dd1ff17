//! Registration templates
//!
//! Static per-(domain, codec) capability databases. Each row seeds one
//! capability record: bounds, default, flags, device property id, the
//! children re-adjusted when the row's resolved value changes, and the
//! adjust/commit policies. The dependency-list builder cross-checks the
//! children lists against every adjust policy's declared parents, so a
//! mistake here fails session setup instead of misordering device pushes.

use crate::controls::types::{CapabilityFlags, CapabilityId as Cap, Codec, Domain};
use crate::platform::ops::*;
use crate::platform::values::*;
use crate::platform::{props, CapabilitySpec, SessionTemplate};

const NONE: CapabilityFlags = CapabilityFlags::empty();
const IN: CapabilityFlags = CapabilityFlags::INPUT_PORT;
const OUT: CapabilityFlags = CapabilityFlags::OUTPUT_PORT;
const MENU_OUT: CapabilityFlags = CapabilityFlags::MENU.union(OUT);
const DYN: CapabilityFlags = CapabilityFlags::DYNAMIC;
const DYN_IN: CapabilityFlags = DYN.union(IN);
const DYN_OUT: CapabilityFlags = DYN.union(OUT);

/// H.264 encoder capability database.
pub static ENCODER_H264: SessionTemplate = SessionTemplate {
    domain: Domain::Encoder,
    codec: Codec::H264,
    caps: &[
        CapabilitySpec {
            id: Cap::FrameWidth,
            min: 96,
            max: 8192,
            step_or_mask: 2,
            default: 1920,
            flags: IN,
            device_id: 0,
            children: &[Cap::MinQuality, Cap::AllIntra],
            adjust: Some(&DimensionAlign),
            commit: None,
        },
        CapabilitySpec {
            id: Cap::FrameHeight,
            min: 96,
            max: 8192,
            step_or_mask: 2,
            default: 1080,
            flags: IN,
            device_id: 0,
            children: &[Cap::MinQuality, Cap::AllIntra],
            adjust: Some(&DimensionAlign),
            commit: None,
        },
        CapabilitySpec {
            id: Cap::FrameRate,
            min: 1,
            max: 240,
            step_or_mask: 1,
            default: 30,
            flags: DYN_OUT,
            device_id: props::FRAME_RATE,
            children: &[Cap::MinQuality, Cap::AllIntra],
            adjust: None,
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: Cap::BitrateMode,
            min: 0,
            max: 2,
            step_or_mask: 0b111,
            default: RC_VBR,
            flags: MENU_OUT,
            device_id: props::RATE_CONTROL,
            children: &[
                Cap::LtrCount,
                Cap::IrPeriod,
                Cap::ConstantQuality,
                Cap::PeakBitrate,
                Cap::MinQuality,
                Cap::BitrateBoost,
                Cap::LowLatency,
            ],
            adjust: None,
            commit: Some(&PushMenu),
        },
        CapabilitySpec {
            id: Cap::Bitrate,
            min: 1,
            max: 245_000_000,
            step_or_mask: 1,
            default: 20_000_000,
            flags: DYN_OUT,
            device_id: props::BITRATE,
            children: &[Cap::PeakBitrate, Cap::BitrateBoost],
            adjust: Some(&BitrateAdjust),
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: Cap::ConstantQuality,
            min: 0,
            max: 100,
            step_or_mask: 1,
            default: 90,
            flags: OUT,
            device_id: props::CONSTANT_QUALITY,
            children: &[],
            adjust: Some(&ConstantQualityAdjust),
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: Cap::Profile,
            min: 0,
            max: 4,
            step_or_mask: 0b10111,
            default: H264_PROFILE_HIGH,
            flags: MENU_OUT,
            device_id: props::PROFILE,
            children: &[Cap::EntropyMode, Cap::Transform8x8],
            adjust: None,
            commit: Some(&PushMenu),
        },
        CapabilitySpec {
            id: Cap::Level,
            min: 0,
            max: 15,
            step_or_mask: 0xFFFF,
            default: 14,
            flags: MENU_OUT,
            device_id: props::LEVEL,
            children: &[],
            adjust: None,
            commit: Some(&PushMenu),
        },
        CapabilitySpec {
            id: Cap::EntropyMode,
            min: 0,
            max: 1,
            step_or_mask: 0b11,
            default: ENTROPY_CABAC,
            flags: MENU_OUT,
            device_id: props::ENTROPY_MODE,
            children: &[],
            adjust: Some(&EntropyModeAdjust),
            commit: Some(&PushMenu),
        },
        CapabilitySpec {
            id: Cap::Transform8x8,
            min: 0,
            max: 1,
            step_or_mask: 1,
            default: 1,
            flags: OUT,
            device_id: props::TRANSFORM_8X8,
            children: &[],
            adjust: Some(&Transform8x8Adjust),
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: Cap::GopSize,
            min: 0,
            max: i32::MAX as i64,
            step_or_mask: 1,
            default: 30,
            flags: DYN_OUT,
            device_id: props::GOP_SIZE,
            children: &[Cap::AllIntra],
            adjust: Some(&GopSizeAdjust),
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: Cap::BFrames,
            min: 0,
            max: MAX_BFRAMES,
            step_or_mask: 1,
            default: 0,
            flags: OUT,
            device_id: props::MAX_B_FRAMES,
            children: &[Cap::AllIntra],
            adjust: Some(&BFramesAdjust),
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: Cap::AllIntra,
            min: 0,
            max: 1,
            step_or_mask: 1,
            default: 0,
            flags: CapabilityFlags::VOLATILE,
            device_id: 0,
            children: &[Cap::LtrCount, Cap::IrPeriod],
            adjust: Some(&AllIntraAdjust),
            commit: None,
        },
        CapabilitySpec {
            id: Cap::LtrCount,
            min: 0,
            max: 2,
            step_or_mask: 1,
            default: 0,
            flags: OUT,
            device_id: props::LTR_COUNT,
            children: &[Cap::UseLtr, Cap::MarkLtr],
            adjust: Some(&LtrCountAdjust),
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: Cap::UseLtr,
            min: 0,
            max: 0b11,
            step_or_mask: 0b11,
            default: 0,
            flags: DYN_IN.union(CapabilityFlags::BITMASK),
            device_id: props::USE_LTR,
            children: &[],
            adjust: Some(&UseLtrAdjust),
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: Cap::MarkLtr,
            min: 0,
            max: 1,
            step_or_mask: 1,
            default: 0,
            flags: DYN_IN,
            device_id: props::MARK_LTR,
            children: &[],
            adjust: Some(&MarkLtrAdjust),
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: Cap::IrPeriod,
            min: 0,
            max: i32::MAX as i64,
            step_or_mask: 1,
            default: 0,
            flags: DYN_OUT,
            device_id: props::IR_PERIOD,
            children: &[],
            adjust: Some(&IrPeriodAdjust),
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: Cap::PeakBitrate,
            min: 0,
            max: 245_000_000,
            step_or_mask: 1,
            default: 20_000_000,
            flags: DYN_OUT,
            device_id: props::PEAK_BITRATE,
            children: &[],
            adjust: Some(&PeakBitrateAdjust),
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: Cap::MinQuality,
            min: 0,
            max: 70,
            step_or_mask: 70,
            default: 70,
            flags: OUT,
            device_id: props::MIN_QUALITY,
            children: &[Cap::BitrateBoost],
            adjust: Some(&MinQualityAdjust),
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: Cap::BitrateBoost,
            min: 0,
            max: MAX_BITRATE_BOOST,
            step_or_mask: MAX_BITRATE_BOOST as u64,
            default: MAX_BITRATE_BOOST,
            flags: DYN_OUT,
            device_id: props::BITRATE_BOOST,
            children: &[],
            adjust: Some(&BitrateBoostAdjust),
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: Cap::LowLatency,
            min: 0,
            max: 1,
            step_or_mask: 1,
            default: 0,
            flags: OUT,
            device_id: props::LOW_LATENCY,
            children: &[],
            adjust: Some(&LowLatencyAdjust),
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: Cap::EnhLayerCount,
            min: 0,
            max: 5,
            step_or_mask: 1,
            default: 0,
            flags: DYN_OUT,
            device_id: props::LAYER_INFO,
            children: &[Cap::GopSize, Cap::BFrames, Cap::MinQuality, Cap::LtrCount],
            adjust: None,
            commit: Some(&PushLayerInfo),
        },
        CapabilitySpec {
            id: Cap::RequestSyncFrame,
            min: 0,
            max: 1,
            step_or_mask: 1,
            default: 0,
            flags: DYN_IN.union(CapabilityFlags::VOLATILE),
            device_id: props::REQUEST_SYNC_FRAME,
            children: &[],
            adjust: None,
            commit: Some(&PushSyncFrame),
        },
        CapabilitySpec {
            id: Cap::Priority,
            min: 0,
            max: 4,
            step_or_mask: 1,
            default: 0,
            flags: DYN,
            device_id: props::SESSION_PRIORITY,
            children: &[],
            adjust: None,
            commit: Some(&PushPriority),
        },
        CapabilitySpec {
            id: Cap::CriticalPriority,
            min: 0,
            max: 1,
            step_or_mask: 1,
            default: 0,
            flags: NONE,
            device_id: 0,
            children: &[],
            adjust: None,
            commit: None,
        },
        CapabilitySpec {
            id: Cap::SecureMode,
            min: 0,
            max: 1,
            step_or_mask: 1,
            default: 0,
            flags: NONE,
            device_id: 0,
            children: &[],
            adjust: None,
            commit: None,
        },
    ],
};

/// HEVC encoder capability database. No entropy-mode or 8x8-transform
/// rows; those are H.264 coding tools.
pub static ENCODER_HEVC: SessionTemplate = SessionTemplate {
    domain: Domain::Encoder,
    codec: Codec::Hevc,
    caps: &[
        CapabilitySpec {
            id: Cap::FrameWidth,
            min: 96,
            max: 8192,
            step_or_mask: 2,
            default: 1920,
            flags: IN,
            device_id: 0,
            children: &[Cap::MinQuality, Cap::AllIntra],
            adjust: Some(&DimensionAlign),
            commit: None,
        },
        CapabilitySpec {
            id: Cap::FrameHeight,
            min: 96,
            max: 8192,
            step_or_mask: 2,
            default: 1080,
            flags: IN,
            device_id: 0,
            children: &[Cap::MinQuality, Cap::AllIntra],
            adjust: Some(&DimensionAlign),
            commit: None,
        },
        CapabilitySpec {
            id: Cap::FrameRate,
            min: 1,
            max: 240,
            step_or_mask: 1,
            default: 30,
            flags: DYN_OUT,
            device_id: props::FRAME_RATE,
            children: &[Cap::MinQuality, Cap::AllIntra],
            adjust: None,
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: Cap::BitrateMode,
            min: 0,
            max: 2,
            step_or_mask: 0b111,
            default: RC_VBR,
            flags: MENU_OUT,
            device_id: props::RATE_CONTROL,
            children: &[
                Cap::LtrCount,
                Cap::IrPeriod,
                Cap::ConstantQuality,
                Cap::PeakBitrate,
                Cap::MinQuality,
                Cap::BitrateBoost,
                Cap::LowLatency,
            ],
            adjust: None,
            commit: Some(&PushMenu),
        },
        CapabilitySpec {
            id: Cap::Bitrate,
            min: 1,
            max: 245_000_000,
            step_or_mask: 1,
            default: 20_000_000,
            flags: DYN_OUT,
            device_id: props::BITRATE,
            children: &[Cap::PeakBitrate, Cap::BitrateBoost],
            adjust: Some(&BitrateAdjust),
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: Cap::ConstantQuality,
            min: 0,
            max: 100,
            step_or_mask: 1,
            default: 90,
            flags: OUT,
            device_id: props::CONSTANT_QUALITY,
            children: &[],
            adjust: Some(&ConstantQualityAdjust),
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: Cap::Profile,
            min: 0,
            max: 3,
            step_or_mask: 0b1111,
            default: HEVC_PROFILE_MAIN,
            flags: MENU_OUT,
            device_id: props::PROFILE,
            children: &[],
            adjust: None,
            commit: Some(&PushMenu),
        },
        CapabilitySpec {
            id: Cap::Level,
            min: 0,
            max: 12,
            step_or_mask: 0x1FFF,
            default: 8,
            flags: MENU_OUT,
            device_id: props::LEVEL,
            children: &[],
            adjust: None,
            commit: Some(&PushMenu),
        },
        CapabilitySpec {
            id: Cap::GopSize,
            min: 0,
            max: i32::MAX as i64,
            step_or_mask: 1,
            default: 30,
            flags: DYN_OUT,
            device_id: props::GOP_SIZE,
            children: &[Cap::AllIntra],
            adjust: Some(&GopSizeAdjust),
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: Cap::BFrames,
            min: 0,
            max: MAX_BFRAMES,
            step_or_mask: 1,
            default: 0,
            flags: OUT,
            device_id: props::MAX_B_FRAMES,
            children: &[Cap::AllIntra],
            adjust: Some(&BFramesAdjust),
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: Cap::AllIntra,
            min: 0,
            max: 1,
            step_or_mask: 1,
            default: 0,
            flags: CapabilityFlags::VOLATILE,
            device_id: 0,
            children: &[Cap::LtrCount, Cap::IrPeriod],
            adjust: Some(&AllIntraAdjust),
            commit: None,
        },
        CapabilitySpec {
            id: Cap::LtrCount,
            min: 0,
            max: 2,
            step_or_mask: 1,
            default: 0,
            flags: OUT,
            device_id: props::LTR_COUNT,
            children: &[Cap::UseLtr, Cap::MarkLtr],
            adjust: Some(&LtrCountAdjust),
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: Cap::UseLtr,
            min: 0,
            max: 0b11,
            step_or_mask: 0b11,
            default: 0,
            flags: DYN_IN.union(CapabilityFlags::BITMASK),
            device_id: props::USE_LTR,
            children: &[],
            adjust: Some(&UseLtrAdjust),
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: Cap::MarkLtr,
            min: 0,
            max: 1,
            step_or_mask: 1,
            default: 0,
            flags: DYN_IN,
            device_id: props::MARK_LTR,
            children: &[],
            adjust: Some(&MarkLtrAdjust),
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: Cap::IrPeriod,
            min: 0,
            max: i32::MAX as i64,
            step_or_mask: 1,
            default: 0,
            flags: DYN_OUT,
            device_id: props::IR_PERIOD,
            children: &[],
            adjust: Some(&IrPeriodAdjust),
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: Cap::PeakBitrate,
            min: 0,
            max: 245_000_000,
            step_or_mask: 1,
            default: 20_000_000,
            flags: DYN_OUT,
            device_id: props::PEAK_BITRATE,
            children: &[],
            adjust: Some(&PeakBitrateAdjust),
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: Cap::MinQuality,
            min: 0,
            max: 70,
            step_or_mask: 70,
            default: 70,
            flags: OUT,
            device_id: props::MIN_QUALITY,
            children: &[Cap::BitrateBoost],
            adjust: Some(&MinQualityAdjust),
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: Cap::BitrateBoost,
            min: 0,
            max: MAX_BITRATE_BOOST,
            step_or_mask: MAX_BITRATE_BOOST as u64,
            default: MAX_BITRATE_BOOST,
            flags: DYN_OUT,
            device_id: props::BITRATE_BOOST,
            children: &[],
            adjust: Some(&BitrateBoostAdjust),
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: Cap::LowLatency,
            min: 0,
            max: 1,
            step_or_mask: 1,
            default: 0,
            flags: OUT,
            device_id: props::LOW_LATENCY,
            children: &[],
            adjust: Some(&LowLatencyAdjust),
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: Cap::EnhLayerCount,
            min: 0,
            max: 5,
            step_or_mask: 1,
            default: 0,
            flags: DYN_OUT,
            device_id: props::LAYER_INFO,
            children: &[Cap::GopSize, Cap::BFrames, Cap::MinQuality, Cap::LtrCount],
            adjust: None,
            commit: Some(&PushLayerInfo),
        },
        CapabilitySpec {
            id: Cap::RequestSyncFrame,
            min: 0,
            max: 1,
            step_or_mask: 1,
            default: 0,
            flags: DYN_IN.union(CapabilityFlags::VOLATILE),
            device_id: props::REQUEST_SYNC_FRAME,
            children: &[],
            adjust: None,
            commit: Some(&PushSyncFrame),
        },
        CapabilitySpec {
            id: Cap::Priority,
            min: 0,
            max: 4,
            step_or_mask: 1,
            default: 0,
            flags: DYN,
            device_id: props::SESSION_PRIORITY,
            children: &[],
            adjust: None,
            commit: Some(&PushPriority),
        },
        CapabilitySpec {
            id: Cap::CriticalPriority,
            min: 0,
            max: 1,
            step_or_mask: 1,
            default: 0,
            flags: NONE,
            device_id: 0,
            children: &[],
            adjust: None,
            commit: None,
        },
        CapabilitySpec {
            id: Cap::SecureMode,
            min: 0,
            max: 1,
            step_or_mask: 1,
            default: 0,
            flags: NONE,
            device_id: 0,
            children: &[],
            adjust: None,
            commit: None,
        },
    ],
};

/// H.264 decoder capability database.
pub static DECODER_H264: SessionTemplate = SessionTemplate {
    domain: Domain::Decoder,
    codec: Codec::H264,
    caps: &[
        CapabilitySpec {
            id: Cap::FrameWidth,
            min: 96,
            max: 8192,
            step_or_mask: 2,
            default: 1920,
            flags: IN,
            device_id: 0,
            children: &[],
            adjust: Some(&DimensionAlign),
            commit: None,
        },
        CapabilitySpec {
            id: Cap::FrameHeight,
            min: 96,
            max: 8192,
            step_or_mask: 2,
            default: 1080,
            flags: IN,
            device_id: 0,
            children: &[],
            adjust: Some(&DimensionAlign),
            commit: None,
        },
        CapabilitySpec {
            id: Cap::LowLatency,
            min: 0,
            max: 1,
            step_or_mask: 1,
            default: 0,
            flags: IN,
            device_id: props::LOW_LATENCY,
            children: &[Cap::OutputOrder],
            adjust: None,
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: Cap::ThumbnailMode,
            min: 0,
            max: 1,
            step_or_mask: 1,
            default: 0,
            flags: IN,
            device_id: props::THUMBNAIL_MODE,
            children: &[Cap::OutputOrder],
            adjust: None,
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: Cap::OutputOrder,
            min: 0,
            max: 1,
            step_or_mask: 1,
            default: OUTPUT_ORDER_DISPLAY,
            flags: OUT,
            device_id: props::OUTPUT_ORDER,
            children: &[],
            adjust: Some(&OutputOrderAdjust),
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: Cap::Priority,
            min: 0,
            max: 4,
            step_or_mask: 1,
            default: 0,
            flags: DYN,
            device_id: props::SESSION_PRIORITY,
            children: &[],
            adjust: None,
            commit: Some(&PushPriority),
        },
        CapabilitySpec {
            id: Cap::SecureMode,
            min: 0,
            max: 1,
            step_or_mask: 1,
            default: 0,
            flags: NONE,
            device_id: 0,
            children: &[],
            adjust: None,
            commit: None,
        },
    ],
};

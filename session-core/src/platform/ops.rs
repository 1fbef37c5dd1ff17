//! Per-capability adjust and commit policies
//!
//! One unit struct per capability kind, stored in the registration
//! templates as trait objects. Adjust ops resolve a capability's legal
//! value from its declared parents; commit ops serialize the resolved
//! value into a device property and push it through the transport.

use tracing::warn;

use crate::controls::adjust::{AdjustCtx, AdjustOp};
use crate::controls::commit::{CommitCtx, CommitOp};
use crate::controls::types::{CapabilityId, Codec};
use crate::error::Result;
use crate::platform::dev;
use crate::platform::values::*;
use crate::transport::{DeviceProperty, DeviceTransport, PropertyPayload, TransportError};

// =============================================================================
// Adjust policies
// =============================================================================

/// Frame dimensions align down to even pixel counts.
pub struct DimensionAlign;

impl AdjustOp for DimensionAlign {
    fn adjust(&self, ctx: &AdjustCtx<'_>) -> Result<i64> {
        Ok(ctx.current() & !1)
    }
}

/// H.264 entropy mode: baseline-family profiles only support CAVLC.
pub struct EntropyModeAdjust;

impl AdjustOp for EntropyModeAdjust {
    fn parents(&self) -> &'static [CapabilityId] {
        &[CapabilityId::Profile]
    }

    fn adjust(&self, ctx: &AdjustCtx<'_>) -> Result<i64> {
        if ctx.info().codec != Codec::H264 {
            warn!(cap = %ctx.cap(), "entropy mode registered for non-h264 codec");
            return Ok(ctx.current());
        }

        let profile = ctx.parent(CapabilityId::Profile)?;
        if profile == H264_PROFILE_BASELINE || profile == H264_PROFILE_CONSTRAINED_BASELINE {
            return Ok(ENTROPY_CAVLC);
        }
        Ok(ctx.current())
    }
}

/// H.264 8x8 transform is a High-profile tool.
pub struct Transform8x8Adjust;

impl AdjustOp for Transform8x8Adjust {
    fn parents(&self) -> &'static [CapabilityId] {
        &[CapabilityId::Profile]
    }

    fn adjust(&self, ctx: &AdjustCtx<'_>) -> Result<i64> {
        let profile = ctx.parent(CapabilityId::Profile)?;
        if profile == H264_PROFILE_HIGH {
            Ok(ctx.current())
        } else {
            Ok(0)
        }
    }
}

/// Layer encoding needs the GOP size to be a multiple of the sub-GOP size,
/// which is 2^layers.
pub struct GopSizeAdjust;

impl AdjustOp for GopSizeAdjust {
    fn parents(&self) -> &'static [CapabilityId] {
        &[CapabilityId::EnhLayerCount]
    }

    fn adjust(&self, ctx: &AdjustCtx<'_>) -> Result<i64> {
        let layers = ctx.parent(CapabilityId::EnhLayerCount)?;
        let requested = ctx.current();
        if layers == 0 {
            return Ok(requested);
        }

        let min_gop = 1i64 << layers;
        let num_subgops = (requested + (min_gop >> 1)) / min_gop;
        if num_subgops > 0 {
            Ok(num_subgops * min_gop)
        } else {
            Ok(min_gop)
        }
    }
}

/// B frames and P-pyramid layering are mutually exclusive.
pub struct BFramesAdjust;

impl AdjustOp for BFramesAdjust {
    fn parents(&self) -> &'static [CapabilityId] {
        &[CapabilityId::EnhLayerCount]
    }

    fn adjust(&self, ctx: &AdjustCtx<'_>) -> Result<i64> {
        let layers = ctx.parent(CapabilityId::EnhLayerCount)?;
        if layers > 0 {
            return Ok(0);
        }
        Ok(ctx.current().min(MAX_BFRAMES))
    }
}

/// All-intra coding engages when the client disables both the GOP and B
/// frames, as long as the macroblock rate fits the engine budget.
pub struct AllIntraAdjust;

impl AdjustOp for AllIntraAdjust {
    fn parents(&self) -> &'static [CapabilityId] {
        &[
            CapabilityId::GopSize,
            CapabilityId::BFrames,
            CapabilityId::FrameWidth,
            CapabilityId::FrameHeight,
            CapabilityId::FrameRate,
        ]
    }

    fn adjust(&self, ctx: &AdjustCtx<'_>) -> Result<i64> {
        let gop = ctx.parent(CapabilityId::GopSize)?;
        let bframes = ctx.parent(CapabilityId::BFrames)?;
        let width = ctx.parent(CapabilityId::FrameWidth)?;
        let height = ctx.parent(CapabilityId::FrameHeight)?;
        let fps = ctx.parent(CapabilityId::FrameRate)?;

        let mbs_per_sec = ((width + 15) / 16) * ((height + 15) / 16) * fps;
        if mbs_per_sec > ctx.info().limits.max_mbps_all_intra as i64 {
            return Ok(0);
        }

        if gop == 0 && bframes == 0 {
            Ok(1)
        } else {
            Ok(0)
        }
    }
}

/// Long-term reference frames: CBR-only, incompatible with all-intra, and
/// bounded by the hardware reference-frame budget shared with layering.
pub struct LtrCountAdjust;

impl AdjustOp for LtrCountAdjust {
    fn parents(&self) -> &'static [CapabilityId] {
        &[
            CapabilityId::BitrateMode,
            CapabilityId::AllIntra,
            CapabilityId::EnhLayerCount,
        ]
    }

    fn adjust(&self, ctx: &AdjustCtx<'_>) -> Result<i64> {
        let rc = ctx.parent(CapabilityId::BitrateMode)?;
        if rc != RC_CBR {
            return Ok(0);
        }

        if let Some(all_intra) = ctx.parent_opt(CapabilityId::AllIntra)? {
            if all_intra != 0 {
                return Ok(0);
            }
        }

        let mut count = ctx.current();
        if let Some(layers) = ctx.parent_opt(CapabilityId::EnhLayerCount)? {
            if layers > 0 && count + layers > MAX_ENC_REFERENCE_FRAMES {
                count = (MAX_ENC_REFERENCE_FRAMES - layers).max(0);
            }
        }
        Ok(count)
    }
}

/// Referenced-LTR bitmask clamps to the allocated slot count.
pub struct UseLtrAdjust;

impl AdjustOp for UseLtrAdjust {
    fn parents(&self) -> &'static [CapabilityId] {
        &[CapabilityId::LtrCount]
    }

    fn adjust(&self, ctx: &AdjustCtx<'_>) -> Result<i64> {
        let ltr_count = ctx.parent(CapabilityId::LtrCount)?;
        if ltr_count == 0 {
            return Ok(0);
        }
        Ok(ctx.current() & ((1 << ltr_count) - 1))
    }
}

/// Marked-LTR slot index clamps to the allocated slot count.
pub struct MarkLtrAdjust;

impl AdjustOp for MarkLtrAdjust {
    fn parents(&self) -> &'static [CapabilityId] {
        &[CapabilityId::LtrCount]
    }

    fn adjust(&self, ctx: &AdjustCtx<'_>) -> Result<i64> {
        let ltr_count = ctx.parent(CapabilityId::LtrCount)?;
        if ltr_count == 0 {
            return Ok(0);
        }
        Ok(ctx.current().min(ltr_count - 1))
    }
}

/// Periodic intra refresh runs under CBR only and never together with
/// all-intra coding.
pub struct IrPeriodAdjust;

impl AdjustOp for IrPeriodAdjust {
    fn parents(&self) -> &'static [CapabilityId] {
        &[CapabilityId::BitrateMode, CapabilityId::AllIntra]
    }

    fn adjust(&self, ctx: &AdjustCtx<'_>) -> Result<i64> {
        let rc = ctx.parent(CapabilityId::BitrateMode)?;
        if rc != RC_CBR {
            return Ok(0);
        }
        if let Some(all_intra) = ctx.parent_opt(CapabilityId::AllIntra)? {
            if all_intra != 0 {
                return Ok(0);
            }
        }
        Ok(ctx.current())
    }
}

/// Peak bitrate applies to CBR and must cover the average bitrate.
pub struct PeakBitrateAdjust;

impl AdjustOp for PeakBitrateAdjust {
    fn parents(&self) -> &'static [CapabilityId] {
        &[CapabilityId::BitrateMode, CapabilityId::Bitrate]
    }

    fn adjust(&self, ctx: &AdjustCtx<'_>) -> Result<i64> {
        let rc = ctx.parent(CapabilityId::BitrateMode)?;
        if rc != RC_CBR {
            return Ok(ctx.current());
        }

        let bitrate = ctx.parent(CapabilityId::Bitrate)?;
        if ctx.client_set() {
            Ok(ctx.current().max(bitrate))
        } else {
            Ok(bitrate)
        }
    }
}

/// Total bitrate clamps to the engine-wide ceiling.
pub struct BitrateAdjust;

impl AdjustOp for BitrateAdjust {
    fn adjust(&self, ctx: &AdjustCtx<'_>) -> Result<i64> {
        Ok(ctx.current().min(ctx.info().limits.max_bitrate as i64))
    }
}

/// Constant-quality target is meaningful only under CQ rate control.
pub struct ConstantQualityAdjust;

impl AdjustOp for ConstantQualityAdjust {
    fn parents(&self) -> &'static [CapabilityId] {
        &[CapabilityId::BitrateMode]
    }

    fn adjust(&self, ctx: &AdjustCtx<'_>) -> Result<i64> {
        let rc = ctx.parent(CapabilityId::BitrateMode)?;
        if rc == RC_CQ {
            Ok(ctx.current())
        } else {
            Ok(0)
        }
    }
}

/// VBR minimum-quality enforcement. Static-only: one of its parents is
/// dynamic, so the cascade can reach it mid-stream, where the resolved
/// value must hold.
pub struct MinQualityAdjust;

impl AdjustOp for MinQualityAdjust {
    fn parents(&self) -> &'static [CapabilityId] {
        &[
            CapabilityId::BitrateMode,
            CapabilityId::EnhLayerCount,
            CapabilityId::FrameWidth,
            CapabilityId::FrameHeight,
            CapabilityId::FrameRate,
        ]
    }

    fn adjust(&self, ctx: &AdjustCtx<'_>) -> Result<i64> {
        if ctx.info().streaming {
            return Ok(ctx.current());
        }

        let rc = ctx.parent(CapabilityId::BitrateMode)?;
        if rc != RC_VBR {
            return Ok(0);
        }

        let layers = ctx.parent(CapabilityId::EnhLayerCount)?;
        if layers > 0 {
            return Ok(0);
        }

        let width = ctx.parent(CapabilityId::FrameWidth)?;
        let height = ctx.parent(CapabilityId::FrameHeight)?;
        if width * height > 1920 * 1088 {
            return Ok(0);
        }

        let fps = ctx.parent(CapabilityId::FrameRate)?;
        if fps > 60 {
            return Ok(0);
        }

        Ok(ctx.current())
    }
}

/// VBR bitrate boost: pinned to the maximum while minimum-quality
/// enforcement is on, dropped entirely when the boosted rate would
/// overrun the engine ceiling.
pub struct BitrateBoostAdjust;

impl AdjustOp for BitrateBoostAdjust {
    fn parents(&self) -> &'static [CapabilityId] {
        &[
            CapabilityId::MinQuality,
            CapabilityId::BitrateMode,
            CapabilityId::Bitrate,
        ]
    }

    fn adjust(&self, ctx: &AdjustCtx<'_>) -> Result<i64> {
        if ctx.info().streaming {
            return Ok(ctx.current());
        }

        let rc = ctx.parent(CapabilityId::BitrateMode)?;
        if rc != RC_VBR {
            return Ok(0);
        }

        let min_quality = ctx.parent(CapabilityId::MinQuality)?;
        if min_quality != 0 {
            return Ok(MAX_BITRATE_BOOST);
        }

        let boost = ctx.current();
        if boost > 0 {
            let bitrate = ctx.parent(CapabilityId::Bitrate)?;
            if bitrate + bitrate * boost / 100 > ctx.info().limits.max_bitrate as i64 {
                return Ok(0);
            }
        }
        Ok(boost)
    }
}

/// Encoder low latency is implied by CBR rate control.
pub struct LowLatencyAdjust;

impl AdjustOp for LowLatencyAdjust {
    fn parents(&self) -> &'static [CapabilityId] {
        &[CapabilityId::BitrateMode]
    }

    fn adjust(&self, ctx: &AdjustCtx<'_>) -> Result<i64> {
        let rc = ctx.parent(CapabilityId::BitrateMode)?;
        if rc == RC_CBR {
            return Ok(1);
        }
        Ok(ctx.current())
    }
}

/// Decoder output order: low-latency and thumbnail sessions deliver in
/// decode order.
pub struct OutputOrderAdjust;

impl AdjustOp for OutputOrderAdjust {
    fn parents(&self) -> &'static [CapabilityId] {
        &[CapabilityId::LowLatency, CapabilityId::ThumbnailMode]
    }

    fn adjust(&self, ctx: &AdjustCtx<'_>) -> Result<i64> {
        let low_latency = ctx.parent(CapabilityId::LowLatency)?;
        let thumbnail = ctx.parent(CapabilityId::ThumbnailMode)?;
        if low_latency != 0 || thumbnail != 0 {
            return Ok(OUTPUT_ORDER_DECODE);
        }
        Ok(ctx.current())
    }
}

// =============================================================================
// Commit policies
// =============================================================================

/// Push the resolved value verbatim as a 32-bit property.
pub struct PushRaw;

impl CommitOp for PushRaw {
    fn commit(
        &self,
        ctx: &CommitCtx<'_>,
        transport: &mut dyn DeviceTransport,
    ) -> std::result::Result<(), TransportError> {
        transport.push_property(DeviceProperty {
            id: ctx.device_id(),
            port: ctx.port(),
            payload: PropertyPayload::U32(ctx.value() as u32),
        })
    }
}

/// Translate a menu index into the device-side enumerant and push it.
pub struct PushMenu;

impl CommitOp for PushMenu {
    fn commit(
        &self,
        ctx: &CommitCtx<'_>,
        transport: &mut dyn DeviceTransport,
    ) -> std::result::Result<(), TransportError> {
        let value = ctx.value();
        let device_value = match ctx.cap() {
            CapabilityId::BitrateMode => match value {
                RC_CBR => dev::RC_CBR_CFR,
                RC_CQ => dev::RC_CQ,
                _ => dev::RC_VBR_CFR,
            },
            CapabilityId::EntropyMode => match value {
                ENTROPY_CABAC => dev::ENTROPY_CABAC,
                _ => dev::ENTROPY_CAVLC,
            },
            // profiles and levels share the client-side numbering
            _ => value as u32,
        };

        transport.push_property(DeviceProperty {
            id: ctx.device_id(),
            port: ctx.port(),
            payload: PropertyPayload::U32Enum(device_value),
        })
    }
}

/// Push the layer structure: hierarchy type packed with the layer count.
pub struct PushLayerInfo;

impl CommitOp for PushLayerInfo {
    fn commit(
        &self,
        ctx: &CommitCtx<'_>,
        transport: &mut dyn DeviceTransport,
    ) -> std::result::Result<(), TransportError> {
        transport.push_property(DeviceProperty {
            id: ctx.device_id(),
            port: ctx.port(),
            payload: PropertyPayload::U32Pair([dev::HIER_P, ctx.value() as u32]),
        })
    }
}

/// One-shot sync-frame request; the push itself is the signal.
pub struct PushSyncFrame;

impl CommitOp for PushSyncFrame {
    fn commit(
        &self,
        ctx: &CommitCtx<'_>,
        transport: &mut dyn DeviceTransport,
    ) -> std::result::Result<(), TransportError> {
        transport.push_property(DeviceProperty {
            id: ctx.device_id(),
            port: ctx.port(),
            payload: PropertyPayload::U32(1),
        })
    }
}

/// Session priority with the firmware offset applied; critical sessions
/// map to the reserved top slot.
pub struct PushPriority;

impl CommitOp for PushPriority {
    fn commit(
        &self,
        ctx: &CommitCtx<'_>,
        transport: &mut dyn DeviceTransport,
    ) -> std::result::Result<(), TransportError> {
        let critical = ctx.value_of(CapabilityId::CriticalPriority).unwrap_or(0);
        let firmware_priority = if critical != 0 {
            0
        } else {
            (ctx.value() + FIRMWARE_PRIORITY_OFFSET) as u32
        };

        transport.push_property(DeviceProperty {
            id: ctx.device_id(),
            port: ctx.port(),
            payload: PropertyPayload::U32(firmware_priority),
        })
    }
}

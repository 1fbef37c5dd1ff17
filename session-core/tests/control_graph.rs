//! Dependency-graph semantics over a purpose-built template
//!
//! Exercises the rate-mode → quality → boost chain: static resolution
//! without device traffic, dependency-ordered commits after a dynamic
//! write, equality-gated idempotence, cycle detection, parent-declaration
//! validation, and atomic-or-nothing failure handling.

mod common;

use common::{init_logging, RecordingTransport};

use videoctl_session_core::controls::{AdjustCtx, AdjustOp};
use videoctl_session_core::platform::ops::PushRaw;
use videoctl_session_core::platform::values::{RC_CBR, RC_VBR};
use videoctl_session_core::platform::{CapabilitySpec, SessionTemplate};
use videoctl_session_core::{
    CapabilityFlags, CapabilityId, Codec, Domain, Error, PropertyPayload, Result, Session,
};

const RATE_ID: u32 = 0x21;
const QUALITY_ID: u32 = 0x22;
const BOOST_ID: u32 = 0x23;

const MENU_DYN_OUT: CapabilityFlags = CapabilityFlags::MENU
    .union(CapabilityFlags::DYNAMIC)
    .union(CapabilityFlags::OUTPUT_PORT);
const OUT: CapabilityFlags = CapabilityFlags::OUTPUT_PORT;

/// Quality tier derived from the rate-control mode.
struct QualityFromRate;

impl AdjustOp for QualityFromRate {
    fn parents(&self) -> &'static [CapabilityId] {
        &[CapabilityId::BitrateMode]
    }

    fn adjust(&self, ctx: &AdjustCtx<'_>) -> Result<i64> {
        Ok(match ctx.parent(CapabilityId::BitrateMode)? {
            RC_CBR => 50,
            RC_VBR => 70,
            _ => 0,
        })
    }
}

/// Boost derived from the quality tier.
struct BoostFromQuality;

impl AdjustOp for BoostFromQuality {
    fn parents(&self) -> &'static [CapabilityId] {
        &[CapabilityId::MinQuality]
    }

    fn adjust(&self, ctx: &AdjustCtx<'_>) -> Result<i64> {
        Ok(if ctx.parent(CapabilityId::MinQuality)? == 70 {
            25
        } else {
            0
        })
    }
}

/// Keeps its value; exists so cycle templates satisfy child requirements.
struct KeepCurrent;

impl AdjustOp for KeepCurrent {
    fn parents(&self) -> &'static [CapabilityId] {
        &[CapabilityId::MinQuality]
    }

    fn adjust(&self, ctx: &AdjustCtx<'_>) -> Result<i64> {
        Ok(ctx.current())
    }
}

/// Fails once the rate mode goes VBR; passes under CBR.
struct QualityFailsOnVbr;

impl AdjustOp for QualityFailsOnVbr {
    fn parents(&self) -> &'static [CapabilityId] {
        &[CapabilityId::BitrateMode]
    }

    fn adjust(&self, ctx: &AdjustCtx<'_>) -> Result<i64> {
        if ctx.parent(CapabilityId::BitrateMode)? == RC_VBR {
            return Err(Error::AdjustFailure {
                cap: ctx.cap(),
                reason: "vbr unsupported by this quality policy".into(),
            });
        }
        Ok(50)
    }
}

static CHAIN: SessionTemplate = SessionTemplate {
    domain: Domain::Encoder,
    codec: Codec::H264,
    caps: &[
        CapabilitySpec {
            id: CapabilityId::BitrateMode,
            min: 0,
            max: 2,
            step_or_mask: 0b111,
            default: RC_CBR,
            flags: MENU_DYN_OUT,
            device_id: RATE_ID,
            children: &[CapabilityId::MinQuality],
            adjust: None,
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: CapabilityId::MinQuality,
            min: 0,
            max: 100,
            step_or_mask: 1,
            default: 0,
            flags: OUT,
            device_id: QUALITY_ID,
            children: &[CapabilityId::BitrateBoost],
            adjust: Some(&QualityFromRate),
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: CapabilityId::BitrateBoost,
            min: 0,
            max: 100,
            step_or_mask: 1,
            default: 0,
            flags: OUT,
            device_id: BOOST_ID,
            children: &[],
            adjust: Some(&BoostFromQuality),
            commit: Some(&PushRaw),
        },
    ],
};

static CYCLE: SessionTemplate = SessionTemplate {
    domain: Domain::Encoder,
    codec: Codec::H264,
    caps: &[
        CapabilitySpec {
            id: CapabilityId::BitrateMode,
            min: 0,
            max: 2,
            step_or_mask: 0b111,
            default: RC_CBR,
            flags: MENU_DYN_OUT,
            device_id: RATE_ID,
            children: &[CapabilityId::MinQuality],
            adjust: Some(&KeepCurrent),
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: CapabilityId::MinQuality,
            min: 0,
            max: 100,
            step_or_mask: 1,
            default: 0,
            flags: OUT,
            device_id: QUALITY_ID,
            children: &[CapabilityId::BitrateMode],
            adjust: Some(&QualityFromRate),
            commit: Some(&PushRaw),
        },
    ],
};

static UNDECLARED_PARENT: SessionTemplate = SessionTemplate {
    domain: Domain::Encoder,
    codec: Codec::H264,
    caps: &[
        CapabilitySpec {
            id: CapabilityId::BitrateMode,
            min: 0,
            max: 2,
            step_or_mask: 0b111,
            default: RC_CBR,
            flags: MENU_DYN_OUT,
            device_id: RATE_ID,
            // quality reads this capability, but the edge is missing here
            children: &[],
            adjust: None,
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: CapabilityId::MinQuality,
            min: 0,
            max: 100,
            step_or_mask: 1,
            default: 0,
            flags: OUT,
            device_id: QUALITY_ID,
            children: &[],
            adjust: Some(&QualityFromRate),
            commit: Some(&PushRaw),
        },
    ],
};

static FAILING_CHILD: SessionTemplate = SessionTemplate {
    domain: Domain::Encoder,
    codec: Codec::H264,
    caps: &[
        CapabilitySpec {
            id: CapabilityId::BitrateMode,
            min: 0,
            max: 2,
            step_or_mask: 0b111,
            default: RC_CBR,
            flags: MENU_DYN_OUT,
            device_id: RATE_ID,
            children: &[CapabilityId::MinQuality],
            adjust: None,
            commit: Some(&PushRaw),
        },
        CapabilitySpec {
            id: CapabilityId::MinQuality,
            min: 0,
            max: 100,
            step_or_mask: 1,
            default: 0,
            flags: OUT,
            device_id: QUALITY_ID,
            children: &[],
            adjust: Some(&QualityFailsOnVbr),
            commit: Some(&PushRaw),
        },
    ],
};

#[test]
fn test_static_writes_resolve_without_commits() {
    init_logging();
    let (transport, log) = RecordingTransport::new();
    let mut session = Session::from_template(&CHAIN, Box::new(transport)).unwrap();

    session
        .set_control(CapabilityId::BitrateMode, RC_CBR)
        .unwrap();
    assert!(log.is_empty(), "static writes must not touch the device");

    session.start_streaming().unwrap();
    assert_eq!(session.control(CapabilityId::MinQuality).unwrap(), 50);
    assert_eq!(session.control(CapabilityId::BitrateBoost).unwrap(), 0);

    // the stream-start drain programs the chain root-to-leaf
    assert_eq!(log.ids(), vec![RATE_ID, QUALITY_ID, BOOST_ID]);
}

#[test]
fn test_dynamic_write_commits_chain_in_order() {
    let (transport, log) = RecordingTransport::new();
    let mut session = Session::from_template(&CHAIN, Box::new(transport)).unwrap();
    session
        .set_control(CapabilityId::BitrateMode, RC_CBR)
        .unwrap();
    session.start_streaming().unwrap();
    log.clear();

    session
        .set_control(CapabilityId::BitrateMode, RC_VBR)
        .unwrap();

    // every member of the chain exactly once, prerequisites first
    assert_eq!(log.ids(), vec![RATE_ID, QUALITY_ID, BOOST_ID]);

    // the pushed payloads carry the already-adjusted values, so adjust ran
    // strictly before commit for each capability
    let pushed = log.pushed();
    assert_eq!(pushed[1].payload, PropertyPayload::U32(70));
    assert_eq!(pushed[2].payload, PropertyPayload::U32(25));
    assert_eq!(session.control(CapabilityId::MinQuality).unwrap(), 70);
    assert_eq!(session.control(CapabilityId::BitrateBoost).unwrap(), 25);
}

#[test]
fn test_repeated_dynamic_write_is_idempotent() {
    let (transport, log) = RecordingTransport::new();
    let mut session = Session::from_template(&CHAIN, Box::new(transport)).unwrap();
    session.start_streaming().unwrap();

    session
        .set_control(CapabilityId::BitrateMode, RC_VBR)
        .unwrap();
    log.clear();

    session
        .set_control(CapabilityId::BitrateMode, RC_VBR)
        .unwrap();
    assert!(
        log.is_empty(),
        "unchanged value must not be pushed a second time"
    );
}

#[test]
fn test_cycle_is_detected_and_fatal() {
    let (transport, log) = RecordingTransport::new();
    let mut session = Session::from_template(&CYCLE, Box::new(transport)).unwrap();

    let err = session.start_streaming().unwrap_err();
    match err {
        Error::DependencyCycle(ids) => {
            assert!(ids.contains(&CapabilityId::BitrateMode));
            assert!(ids.contains(&CapabilityId::MinQuality));
        }
        other => panic!("expected DependencyCycle, got {other}"),
    }
    assert!(log.is_empty(), "a cyclic graph must never program the device");
}

#[test]
fn test_undeclared_parent_fails_graph_validation() {
    let (transport, _log) = RecordingTransport::new();
    let mut session = Session::from_template(&UNDECLARED_PARENT, Box::new(transport)).unwrap();

    let err = session.start_streaming().unwrap_err();
    assert!(matches!(err, Error::InvalidGraph(_)), "got {err}");
}

#[test]
fn test_failed_child_adjust_commits_nothing() {
    let (transport, log) = RecordingTransport::new();
    let mut session = Session::from_template(&FAILING_CHILD, Box::new(transport)).unwrap();
    session.start_streaming().unwrap();
    log.clear();

    let err = session
        .set_control(CapabilityId::BitrateMode, RC_VBR)
        .unwrap_err();
    assert!(matches!(err, Error::AdjustFailure { .. }));
    assert!(
        log.is_empty(),
        "a failed cascade must discard all pending commits"
    );
}

#[test]
fn test_unregistered_capability_rejected() {
    let (transport, _log) = RecordingTransport::new();
    let mut session = Session::from_template(&CHAIN, Box::new(transport)).unwrap();

    let err = session.set_control(CapabilityId::GopSize, 30).unwrap_err();
    assert!(matches!(err, Error::InvalidCapability(CapabilityId::GopSize)));
}

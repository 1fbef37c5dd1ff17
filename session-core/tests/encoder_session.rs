//! End-to-end behavior of the built-in encoder and decoder templates

mod common;

use common::{init_logging, RecordingTransport};

use videoctl_session_core::platform::{props, values};
use videoctl_session_core::{
    CapabilityId, Codec, Domain, Error, PropertyPayload, Session,
};

fn encoder(codec: Codec) -> (Session, common::PushLog) {
    let (transport, log) = RecordingTransport::new();
    let session = Session::new(Domain::Encoder, codec, Box::new(transport)).unwrap();
    (session, log)
}

#[test]
fn test_stream_start_programs_device_in_dependency_order() {
    init_logging();
    let (mut session, log) = encoder(Codec::H264);
    session
        .set_control(CapabilityId::BitrateMode, values::RC_CBR)
        .unwrap();
    session.start_streaming().unwrap();

    let ids = log.ids();
    let pos = |id: u32| ids.iter().position(|&x| x == id).unwrap();

    // rate control gates quality, refresh and latency policies
    assert!(pos(props::RATE_CONTROL) < pos(props::MIN_QUALITY));
    assert!(pos(props::RATE_CONTROL) < pos(props::LTR_COUNT));
    assert!(pos(props::RATE_CONTROL) < pos(props::LOW_LATENCY));
    // peak bitrate follows the average bitrate
    assert!(pos(props::BITRATE) < pos(props::PEAK_BITRATE));
}

#[test]
fn test_cbr_implies_low_latency_and_vbr_disables_ltr() {
    let (mut session, _log) = encoder(Codec::H264);
    session
        .set_control(CapabilityId::BitrateMode, values::RC_CBR)
        .unwrap();
    session.set_control(CapabilityId::LtrCount, 2).unwrap();
    session.start_streaming().unwrap();

    assert_eq!(session.control(CapabilityId::LowLatency).unwrap(), 1);
    assert_eq!(session.control(CapabilityId::LtrCount).unwrap(), 2);

    let (mut session, _log) = encoder(Codec::H264);
    session
        .set_control(CapabilityId::BitrateMode, values::RC_VBR)
        .unwrap();
    session.set_control(CapabilityId::LtrCount, 2).unwrap();
    session.start_streaming().unwrap();

    assert_eq!(session.control(CapabilityId::LowLatency).unwrap(), 0);
    assert_eq!(session.control(CapabilityId::LtrCount).unwrap(), 0);
}

#[test]
fn test_vbr_min_quality_pins_bitrate_boost() {
    let (mut session, _log) = encoder(Codec::Hevc);
    session
        .set_control(CapabilityId::BitrateMode, values::RC_VBR)
        .unwrap();
    session.set_control(CapabilityId::BitrateBoost, 0).unwrap();
    session.start_streaming().unwrap();

    // 1080p30 VBR keeps minimum-quality enforcement on, which overrides
    // the client's boost choice
    assert_eq!(session.control(CapabilityId::MinQuality).unwrap(), 70);
    assert_eq!(
        session.control(CapabilityId::BitrateBoost).unwrap(),
        values::MAX_BITRATE_BOOST
    );
}

#[test]
fn test_baseline_profile_forces_cavlc() {
    let (mut session, log) = encoder(Codec::H264);
    session
        .set_control(CapabilityId::Profile, values::H264_PROFILE_BASELINE)
        .unwrap();
    session
        .set_control(CapabilityId::EntropyMode, values::ENTROPY_CABAC)
        .unwrap();
    session.start_streaming().unwrap();

    assert_eq!(
        session.control(CapabilityId::EntropyMode).unwrap(),
        values::ENTROPY_CAVLC
    );
    // 8x8 transform is a High-profile tool
    assert_eq!(session.control(CapabilityId::Transform8x8).unwrap(), 0);

    let entropy_push = log
        .pushed()
        .into_iter()
        .find(|p| p.id == props::ENTROPY_MODE)
        .unwrap();
    assert_eq!(entropy_push.payload, PropertyPayload::U32Enum(0));
}

#[test]
fn test_dynamic_bitrate_cascades_to_peak() {
    let (mut session, log) = encoder(Codec::H264);
    session
        .set_control(CapabilityId::BitrateMode, values::RC_CBR)
        .unwrap();
    session.set_control(CapabilityId::Bitrate, 6_000_000).unwrap();
    session.start_streaming().unwrap();
    log.clear();

    session.set_control(CapabilityId::Bitrate, 8_000_000).unwrap();

    assert_eq!(session.control(CapabilityId::PeakBitrate).unwrap(), 8_000_000);
    let ids = log.ids();
    assert_eq!(ids, vec![props::BITRATE, props::PEAK_BITRATE]);
}

#[test]
fn test_dynamic_noop_write_pushes_nothing() {
    let (mut session, log) = encoder(Codec::H264);
    session.start_streaming().unwrap();
    log.clear();

    let gop = session.control(CapabilityId::GopSize).unwrap();
    session.set_control(CapabilityId::GopSize, gop).unwrap();
    assert!(log.is_empty());
}

#[test]
fn test_sync_frame_request_fires_every_time() {
    let (mut session, log) = encoder(Codec::H264);
    session.start_streaming().unwrap();
    log.clear();

    session
        .set_control(CapabilityId::RequestSyncFrame, 1)
        .unwrap();
    session
        .set_control(CapabilityId::RequestSyncFrame, 1)
        .unwrap();
    assert_eq!(log.count(props::REQUEST_SYNC_FRAME), 2);
}

#[test]
fn test_resolution_is_static_only() {
    let (mut session, _log) = encoder(Codec::H264);
    session.set_control(CapabilityId::FrameWidth, 1280).unwrap();
    session.start_streaming().unwrap();

    let err = session.set_control(CapabilityId::FrameWidth, 640).unwrap_err();
    assert!(matches!(
        err,
        Error::NotDynamicallyAdjustable(CapabilityId::FrameWidth)
    ));
}

#[test]
fn test_layer_change_rounds_gop_mid_stream() {
    let (mut session, log) = encoder(Codec::H264);
    session.set_control(CapabilityId::GopSize, 30).unwrap();
    session.start_streaming().unwrap();
    log.clear();

    session.set_control(CapabilityId::EnhLayerCount, 2).unwrap();

    // 30 rounds to the nearest multiple of the 2^2 sub-GOP size
    assert_eq!(session.control(CapabilityId::GopSize).unwrap(), 32);
    assert_eq!(log.count(props::LAYER_INFO), 1);
    assert_eq!(log.count(props::GOP_SIZE), 1);

    let ids = log.ids();
    let layer_pos = ids.iter().position(|&x| x == props::LAYER_INFO).unwrap();
    let gop_pos = ids.iter().position(|&x| x == props::GOP_SIZE).unwrap();
    assert!(layer_pos < gop_pos, "layer structure precedes the GOP it shapes");
}

#[test]
fn test_transport_failure_surfaces_and_leaves_prefix() {
    let (transport, log) = RecordingTransport::failing_on(props::PEAK_BITRATE);
    let mut session =
        Session::new(Domain::Encoder, Codec::H264, Box::new(transport)).unwrap();
    session
        .set_control(CapabilityId::BitrateMode, values::RC_CBR)
        .unwrap();

    let err = session.start_streaming().unwrap_err();
    assert!(matches!(err, Error::Transport(_)));

    // everything before the failing property reached the device and stays
    assert!(log.count(props::RATE_CONTROL) == 1);
    assert_eq!(log.count(props::PEAK_BITRATE), 0);
}

#[test]
fn test_decoder_thumbnail_forces_decode_order() {
    let (transport, log) = RecordingTransport::new();
    let mut session =
        Session::new(Domain::Decoder, Codec::H264, Box::new(transport)).unwrap();
    session.set_control(CapabilityId::ThumbnailMode, 1).unwrap();
    session.start_streaming().unwrap();

    assert_eq!(
        session.control(CapabilityId::OutputOrder).unwrap(),
        values::OUTPUT_ORDER_DECODE
    );
    let order_push = log
        .pushed()
        .into_iter()
        .find(|p| p.id == props::OUTPUT_ORDER)
        .unwrap();
    assert_eq!(order_push.payload, PropertyPayload::U32(1));
}

#[test]
fn test_control_surface_enumerates_registered_caps() {
    let (session, _log) = encoder(Codec::H264);
    let descriptors = session.query_controls();

    assert!(descriptors.iter().any(|d| d.cap == CapabilityId::BitrateMode));
    assert!(descriptors.iter().all(|d| d.cap != CapabilityId::OutputOrder));

    let menu = session.query_menu(CapabilityId::Profile).unwrap().unwrap();
    assert_eq!(menu.len(), 5);
}

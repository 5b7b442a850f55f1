//! Wire protocol unit tests

use ar_pose_bridge::protocol::{
    categories, pose_from_packet, EventKind, HeartbeatRequest, HeartbeatResponse, Packet,
    PacketKind, ProtocolError,
};
use ar_pose_bridge::types::{PoseSnapshot, Vec3};

fn sample_pose() -> PoseSnapshot {
    PoseSnapshot::new(
        "unity",
        Vec3::new(1.0, 2.0, 3.0),
        Vec3::new(0.0, 90.0, 0.0),
    )
}

fn sample_heartbeat() -> HeartbeatRequest {
    HeartbeatRequest {
        ip_address: "10.0.0.5".into(),
        server_port: 48528,
        saved_position: sample_pose(),
    }
}

// ---------------------------------------------------------------------------
// Round-trip law
// ---------------------------------------------------------------------------

#[test]
fn heartbeat_request_round_trips() {
    let packet = Packet::heartbeat_request(&sample_heartbeat()).unwrap();
    let decoded = Packet::decode(&packet.encode().unwrap()).unwrap();
    assert_eq!(decoded, packet);
    assert_eq!(
        HeartbeatRequest::from_packet(&decoded).unwrap(),
        sample_heartbeat()
    );
}

#[test]
fn heartbeat_response_round_trips() {
    let packet = Packet::heartbeat_response("POSITIONING");
    let decoded = Packet::decode(&packet.encode().unwrap()).unwrap();
    assert_eq!(decoded, packet);
    let payload = HeartbeatResponse::from_packet(&decoded).unwrap();
    assert_eq!(payload.status, "POSITIONING");
}

#[test]
fn position_round_trips() {
    let packet = Packet::position(&sample_pose()).unwrap();
    let decoded = Packet::decode(&packet.encode().unwrap()).unwrap();
    assert_eq!(decoded, packet);
    assert_eq!(pose_from_packet(&decoded).unwrap(), sample_pose());
}

#[test]
fn event_packets_round_trip() {
    for kind in [EventKind::PlayStart, EventKind::Reset] {
        let packet = Packet::event(kind);
        let decoded = Packet::decode(&packet.encode().unwrap()).unwrap();
        assert_eq!(decoded, packet);
        assert_eq!(decoded.kind, PacketKind::Event);
        assert_eq!(decoded.event_name.as_deref(), Some(kind.as_str()));
        assert!(decoded.category.is_none());
    }
}

// ---------------------------------------------------------------------------
// Event validation
// ---------------------------------------------------------------------------

#[test]
fn known_event_names_parse() {
    assert_eq!(
        EventKind::from_name("play_start").unwrap(),
        EventKind::PlayStart
    );
    assert_eq!(EventKind::from_name("reset").unwrap(), EventKind::Reset);
}

#[test]
fn unknown_event_name_is_rejected() {
    let err = EventKind::from_name("jump").unwrap_err();
    assert!(matches!(err, ProtocolError::InvalidEvent(name) if name == "jump"));
}

// ---------------------------------------------------------------------------
// Cache keys
// ---------------------------------------------------------------------------

#[test]
fn cache_key_is_category_for_data_and_name_for_events() {
    let hb = Packet::heartbeat_request(&sample_heartbeat()).unwrap();
    assert_eq!(hb.cache_key(), Some(categories::HEARTBEAT_REQUEST));

    let ev = Packet::event(EventKind::Reset);
    assert_eq!(ev.cache_key(), Some(categories::RESET));
}

#[test]
fn inconsistent_envelope_has_no_cache_key() {
    // An event packet whose event_name is missing violates the invariant.
    let packet = Packet {
        kind: PacketKind::Event,
        category: Some(categories::POSITION.into()),
        event_name: None,
        data: None,
    };
    assert_eq!(packet.cache_key(), None);
}

// ---------------------------------------------------------------------------
// Schema failures
// ---------------------------------------------------------------------------

#[test]
fn typed_payload_rejects_wrong_category() {
    let packet = Packet::position(&sample_pose()).unwrap();
    assert!(matches!(
        HeartbeatRequest::from_packet(&packet),
        Err(ProtocolError::Schema { .. })
    ));
}

#[test]
fn typed_payload_rejects_event_packet() {
    let packet = Packet::event(EventKind::PlayStart);
    assert!(matches!(
        pose_from_packet(&packet),
        Err(ProtocolError::Schema { .. })
    ));
}

#[test]
fn missing_required_field_is_a_schema_error() {
    // Position payload without an orientation.
    let packet = Packet {
        kind: PacketKind::Data,
        category: Some(categories::POSITION.into()),
        event_name: None,
        data: Some(serde_json::json!({
            "frame_type": "unity",
            "position": {"x": 1.0, "y": 2.0, "z": 3.0}
        })),
    };
    assert!(matches!(
        pose_from_packet(&packet),
        Err(ProtocolError::Schema { .. })
    ));
}

#[test]
fn garbage_bytes_fail_to_decode() {
    assert!(matches!(
        Packet::decode(b"not json at all"),
        Err(ProtocolError::Decode(_))
    ));
}

//! Tests for the event model

use bytes::Bytes;

use crate::{DecisionStatus, Event, EventKind, Id, StreamKind};

fn consensus_event() -> Event {
    Event::Consensus {
        container_id: Id::from_bytes([0xaa; 32]),
        payload: Bytes::from_static(&[1, 2, 3]),
    }
}

fn decision_event(status: DecisionStatus) -> Event {
    Event::Decision {
        container_id: Id::from_bytes([0xbb; 32]),
        payload: Bytes::from_static(&[9, 8]),
        status,
    }
}

#[test]
fn test_accessors() {
    let ev = consensus_event();
    assert_eq!(ev.kind(), EventKind::Consensus);
    assert_eq!(ev.container_id(), &Id::from_bytes([0xaa; 32]));
    assert_eq!(ev.payload().as_ref(), &[1, 2, 3]);
    assert_eq!(ev.status(), None);

    let ev = decision_event(DecisionStatus::Rejected);
    assert_eq!(ev.kind(), EventKind::Decision);
    assert_eq!(ev.status(), Some(DecisionStatus::Rejected));
}

#[test]
fn test_event_kind_wire_values() {
    assert_eq!(EventKind::Consensus.to_u8(), 0x01);
    assert_eq!(EventKind::Decision.to_u8(), 0x02);
    assert_eq!(EventKind::from_u8(0x01), Some(EventKind::Consensus));
    assert_eq!(EventKind::from_u8(0x02), Some(EventKind::Decision));
    assert_eq!(EventKind::from_u8(0x00), None);
    assert_eq!(EventKind::from_u8(0xff), None);
}

#[test]
fn test_decision_status_roundtrip() {
    assert_eq!(
        DecisionStatus::from_u8(DecisionStatus::Accepted.to_u8()).unwrap(),
        DecisionStatus::Accepted
    );
    assert_eq!(
        DecisionStatus::from_u8(DecisionStatus::Rejected.to_u8()).unwrap(),
        DecisionStatus::Rejected
    );
    assert!(DecisionStatus::from_u8(0x02).is_err());
}

#[test]
fn test_stream_kind_names() {
    assert_eq!(StreamKind::Consensus.as_str(), "consensus");
    assert_eq!(StreamKind::Decisions.as_str(), "decisions");
    assert_eq!(StreamKind::Decisions.to_string(), "decisions");
}

//! Property tests for presence tracking.

use oruca_hardware::{CardFamily, TagHandle, TagReadError};
use oruca_presence::PresenceTracker;
use proptest::prelude::*;

fn valid_payload() -> impl Strategy<Value = String> {
    (prop::sample::select(vec!["01", "02", "11"]), "[A-Z0-9]{7}")
        .prop_map(|(role, id)| format!("{role}{id}"))
}

#[derive(Debug, Clone)]
enum Event {
    Connect(String),
    Unreadable,
    Release,
}

fn event() -> impl Strategy<Value = Event> {
    prop_oneof![
        4 => valid_payload().prop_map(Event::Connect),
        1 => Just(Event::Unreadable),
        2 => Just(Event::Release),
    ]
}

fn unreadable() -> TagHandle {
    TagHandle::builder(CardFamily::FelicaStandard)
        .read_error(TagReadError::read_failed("card left the field"))
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn n_connects_then_release_publish_latest_once(
        payloads in prop::collection::vec(valid_payload(), 1..10)
    ) {
        let mut tracker = PresenceTracker::new();
        for payload in &payloads {
            tracker.on_connect(&TagHandle::felica(payload.as_str()));
        }

        let intent = tracker.on_release();
        prop_assert!(intent.is_some());
        let intent = intent.unwrap();
        let latest = payloads.last().unwrap();
        prop_assert_eq!(intent.record.student_id.as_str(), &latest[2..9]);

        prop_assert!(tracker.on_release().is_none());
    }

    #[test]
    fn publishes_match_a_reference_model(events in prop::collection::vec(event(), 0..40)) {
        let mut tracker = PresenceTracker::new();
        let mut armed: Option<String> = None;

        for event in events {
            match event {
                Event::Connect(payload) => {
                    tracker.on_connect(&TagHandle::felica(payload.as_str()));
                    armed = Some(payload[2..9].to_string());
                }
                Event::Unreadable => {
                    tracker.on_connect(&unreadable());
                    armed = None;
                }
                Event::Release => {
                    let published = tracker
                        .on_release()
                        .map(|intent| intent.record.student_id.as_str().to_string());
                    prop_assert_eq!(published, armed.take());
                }
            }
            prop_assert_eq!(tracker.is_armed(), armed.is_some());
        }
    }

    #[test]
    fn settled_never_exceeds_releases(events in prop::collection::vec(event(), 0..40)) {
        let mut tracker = PresenceTracker::new();
        let mut releases = 0u64;

        for event in events {
            match event {
                Event::Connect(payload) => tracker.on_connect(&TagHandle::felica(payload.as_str())),
                Event::Unreadable => tracker.on_connect(&unreadable()),
                Event::Release => {
                    releases += 1;
                    tracker.on_release();
                }
            }
        }

        let stats = tracker.stats();
        prop_assert_eq!(stats.settled + stats.empty_releases, releases);
    }
}

#[test]
fn failed_read_between_connect_and_release_suppresses_publish() {
    let mut tracker = PresenceTracker::new();

    tracker.on_connect(&TagHandle::felica("01AB12345"));
    tracker.on_connect(&TagHandle::felica("0"));

    assert!(tracker.on_release().is_none());
}

//! Property-based tests using proptest
//!
//! These tests verify the decoding of directory pages and room state,
//! and that enrichment preserves listing order and child counts.

use async_trait::async_trait;
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use syncli::spaces::{self, parse_detail, parse_listing, state_path, Enricher, PUBLIC_ROOMS_PATH};
use syncli::synapse::{Request, Transport, TransportError};
use tokio::time::Instant;

/// Generate an arbitrary public room directory entry
fn arb_room() -> impl Strategy<Value = (String, Option<String>, u64)> {
    (
        "![a-zA-Z0-9]{4,18}:[a-z]{3,10}\\.(org|net)",
        prop::option::of("[ -~]{0,40}"),
        0u64..1_000_000,
    )
}

/// Generate a list of unique rooms
fn arb_rooms() -> impl Strategy<Value = Vec<(String, Option<String>, u64)>> {
    prop::collection::vec(arb_room(), 0..30).prop_map(|rooms| {
        let mut seen = std::collections::HashSet::new();
        rooms
            .into_iter()
            .filter(|(id, _, _)| seen.insert(id.clone()))
            .collect()
    })
}

fn listing_json(rooms: &[(String, Option<String>, u64)]) -> Vec<u8> {
    let chunk: Vec<Value> = rooms
        .iter()
        .map(|(id, name, members)| match name {
            Some(name) => json!({"room_id": id, "name": name, "num_joined_members": members}),
            None => json!({"room_id": id, "num_joined_members": members}),
        })
        .collect();
    json!({ "chunk": chunk }).to_string().into_bytes()
}

/// Generate an arbitrary state event; only some are space children
fn arb_event() -> impl Strategy<Value = Value> {
    (
        prop_oneof![
            Just("m.space.child"),
            Just("m.space.parent"),
            Just("m.room.name"),
            Just("m.room.member"),
        ],
        prop::option::of("![a-z0-9]{4,12}:example\\.org"),
    )
        .prop_map(|(event_type, state_key)| match state_key {
            Some(key) => json!({"type": event_type, "state_key": key, "content": {}}),
            None => json!({"type": event_type, "content": {}}),
        })
}

fn arb_state() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(arb_event(), 0..40)
}

fn state_json(events: &[Value]) -> Vec<u8> {
    json!({ "state": events }).to_string().into_bytes()
}

fn qualifying(events: &[Value]) -> Vec<String> {
    events
        .iter()
        .filter(|e| e["type"] == "m.space.child")
        .filter_map(|e| e["state_key"].as_str().map(String::from))
        .collect()
}

/// Serves canned bodies keyed by path
struct CannedTransport {
    bodies: HashMap<String, Vec<u8>>,
}

#[async_trait]
impl Transport for CannedTransport {
    async fn call(
        &self,
        request: &Request,
        _deadline: Instant,
        _retry: bool,
    ) -> Result<Vec<u8>, TransportError> {
        tokio::task::yield_now().await;
        self.bodies
            .get(&request.path)
            .cloned()
            .ok_or_else(|| TransportError::Status {
                url: request.path.clone(),
                status: 404,
            })
    }
}

proptest! {
    /// Parsing the same listing twice gives equal results
    #[test]
    fn listing_parse_is_idempotent(rooms in arb_rooms()) {
        let data = listing_json(&rooms);
        prop_assert_eq!(parse_listing(&data).unwrap(), parse_listing(&data).unwrap());
    }

    /// Every directory entry becomes one un-enriched space, in order
    #[test]
    fn listing_preserves_entries(rooms in arb_rooms()) {
        let spaces = parse_listing(&listing_json(&rooms)).unwrap();
        prop_assert_eq!(spaces.len(), rooms.len());
        for (space, (id, name, members)) in spaces.iter().zip(&rooms) {
            prop_assert_eq!(&space.id, id);
            prop_assert_eq!(&space.name, &name.clone().unwrap_or_default());
            prop_assert_eq!(space.members, *members);
            prop_assert_eq!(space.child_count, 0);
            prop_assert!(space.child_rooms.is_empty());
        }
    }

    /// Child count always equals the number of child rooms
    #[test]
    fn detail_count_matches_rooms(events in arb_state()) {
        let children = parse_detail(&state_json(&events)).unwrap();
        prop_assert_eq!(children.count, children.rooms.len());
        prop_assert_eq!(children.rooms, qualifying(&events));
    }

    /// Parsing the same state twice gives equal results
    #[test]
    fn detail_parse_is_idempotent(events in arb_state()) {
        let data = state_json(&events);
        prop_assert_eq!(parse_detail(&data).unwrap(), parse_detail(&data).unwrap());
    }

    /// Truncated payloads never decode successfully
    #[test]
    fn truncated_state_is_rejected(events in arb_state(), cut in 1usize..8) {
        let data = state_json(&events);
        let truncated = &data[..data.len().saturating_sub(cut)];
        prop_assert!(parse_detail(truncated).is_err());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Enrichment keeps listing order and attaches each space's own children
    #[test]
    fn enrichment_preserves_order_and_counts(
        rooms in arb_rooms(),
        states in prop::collection::vec(arb_state(), 30),
        limit in 1usize..12,
    ) {
        let mut bodies = HashMap::new();
        bodies.insert(PUBLIC_ROOMS_PATH.to_string(), listing_json(&rooms));
        for ((id, _, _), events) in rooms.iter().zip(&states) {
            bodies.insert(state_path(id), state_json(events));
        }

        let transport = Arc::new(CannedTransport { bodies });
        let result = tokio_test::block_on(
            Enricher::new(transport)
                .with_concurrency_limit(limit)
                .enrich(&spaces::listing_request(200)),
        );
        let enriched = result.unwrap();

        prop_assert_eq!(enriched.len(), rooms.len());
        for ((space, (id, _, _)), events) in enriched.iter().zip(&rooms).zip(&states) {
            prop_assert_eq!(&space.id, id);
            prop_assert_eq!(space.child_count, space.child_rooms.len());
            prop_assert_eq!(&space.child_rooms, &qualifying(events));
        }
    }
}

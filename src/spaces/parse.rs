//! Decoding of directory listings and room state

use super::error::DecodeError;
use super::model::{ChildRelations, Space};
use serde::Deserialize;
use serde_json::json;

/// Event type linking a space to one of its children
pub const SPACE_CHILD_EVENT: &str = "m.space.child";

/// Room type used to filter the public room directory down to spaces
pub const SPACE_ROOM_TYPE: &str = "m.space";

/// Body of `POST /_matrix/client/v3/publicRooms` restricted to spaces
pub fn public_rooms_body(limit: u32) -> serde_json::Value {
    json!({
        "limit": limit,
        "filter": { "room_types": [SPACE_ROOM_TYPE] },
    })
}

#[derive(Debug, Deserialize)]
struct PublicRoomsResponse {
    #[serde(default)]
    chunk: Vec<PublicRoomsChunk>,
}

#[derive(Debug, Deserialize)]
struct PublicRoomsChunk {
    room_id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    num_joined_members: u64,
}

#[derive(Debug, Deserialize)]
struct StateResponse {
    #[serde(default)]
    state: Vec<StateEvent>,
}

#[derive(Debug, Deserialize)]
struct StateEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    state_key: Option<String>,
}

/// Decode a public room directory page into un-enriched spaces
pub fn parse_listing(data: &[u8]) -> Result<Vec<Space>, DecodeError> {
    let response: PublicRoomsResponse =
        serde_json::from_slice(data).map_err(DecodeError::listing)?;

    Ok(response
        .chunk
        .into_iter()
        .map(|room| Space::new(room.room_id, room.name.unwrap_or_default(), room.num_joined_members))
        .collect())
}

/// Decode a room's state and keep only `m.space.child` events with a state key
pub fn parse_detail(data: &[u8]) -> Result<ChildRelations, DecodeError> {
    let response: StateResponse = serde_json::from_slice(data).map_err(DecodeError::state)?;

    let rooms: Vec<String> = response
        .state
        .into_iter()
        .filter(|event| event.event_type == SPACE_CHILD_EVENT)
        .filter_map(|event| event.state_key)
        .collect();

    Ok(ChildRelations {
        count: rooms.len(),
        rooms,
    })
}

// Data shapes exchanged with the snapsecounter API.
//
// The server owns every one of these; the client only keeps the latest
// snapshot it fetched and never edits them locally.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

/// Entry of the `events/` listing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EventSummary {
    pub id: u64,
    pub name: String,
}

/// Full event detail, including every drink recorded for it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Event {
    pub id: u64,
    pub name: String,
    #[serde(rename = "drinkevents", alias = "drink_events", default)]
    pub drinks: Vec<DrinkRecord>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub id: u64,
    pub username: String,
}

/// A single "drink taken" action. The server stamps `datetime` when the
/// drink is posted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DrinkRecord {
    pub user: u64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub datetime: NaiveDateTime,
}

/// Payload for `POST events/`.
#[derive(Serialize, Debug)]
pub struct NewEvent<'a> {
    pub name: &'a str,
}

/// Reply to `POST events/`; only the id is needed afterwards.
#[derive(Deserialize, Debug)]
pub struct CreatedEvent {
    pub id: u64,
}

/// Parse an ISO-8601 timestamp as naive local time.
///
/// A trailing `Z` zone marker is dropped rather than converted, so
/// `2019-06-21T22:15:00Z` reads as 22:15 on the wall clock.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    let trimmed = raw.trim();
    let naive = trimmed
        .strip_suffix('Z')
        .or_else(|| trimmed.strip_suffix('z'))
        .unwrap_or(trimmed);
    NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S%.f")
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(|e| serde::de::Error::custom(format!("{raw:?}: {e}")))
}

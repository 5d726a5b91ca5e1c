use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::ArchiveError;

/// One game entry of a monthly archive, as served by the public API.
///
/// Every field is optional and tolerant of type drift: a value of the wrong JSON type
/// deserializes as `None` instead of failing the whole game.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawGame {
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub pgn: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub time_control: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub start_time: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub end_time: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub rated: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub accuracies: Option<Accuracies>,
    #[serde(default, deserialize_with = "lenient")]
    pub tcn: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub uuid: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub initial_setup: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub fen: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub time_class: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub rules: Option<String>,
    /// Opening classification link (`https://www.chess.com/openings/...`).
    #[serde(default, deserialize_with = "lenient")]
    pub eco: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub tournament: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub r#match: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub white: Option<PlayerSide>,
    #[serde(default, deserialize_with = "lenient")]
    pub black: Option<PlayerSide>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerSide {
    #[serde(default, deserialize_with = "lenient")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub rating: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub result: Option<String>,
    #[serde(rename = "@id", default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub uuid: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Accuracies {
    #[serde(default, deserialize_with = "lenient")]
    pub white: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub black: Option<f64>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl RawGame {
    /// Converts one element of the `games` array.
    ///
    /// Returns `None` when the element is not a JSON object; callers still emit a row for it.
    pub fn from_value(value: Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value).ok()
    }
}

#[derive(Debug, Deserialize)]
struct ArchiveDocument {
    games: Vec<Value>,
}

/// Parses a player-month document of shape `{ "games": [ ... ] }`.
///
/// Only the document shape can fail; the game entries are returned untouched.
pub fn parse_archive_document(text: &str) -> Result<Vec<Value>, ArchiveError> {
    serde_json::from_str::<ArchiveDocument>(text)
        .map(|doc| doc.games)
        .map_err(|e| ArchiveError::new(format!("Invalid archive document: {e}")))
}

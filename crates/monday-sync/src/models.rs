//! Type definitions for monday.com entities.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A monday.com item (a "pulse" in webhook terms).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Item {
    /// Item ID
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub id: Option<String>,
    /// Item name
    #[serde(default)]
    pub name: Option<String>,
    /// Column values requested by the query
    #[serde(default, deserialize_with = "null_as_default")]
    pub column_values: Vec<ColumnValue>,
    /// Child items, when requested
    #[serde(default, deserialize_with = "null_as_default")]
    pub subitems: Vec<Subitem>,
}

impl Item {
    /// Display name for logs.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown")
    }
}

/// A single column value on an item.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnValue {
    /// Column identifier (e.g. `date7`)
    #[serde(default)]
    pub id: String,
    /// Column type tag (e.g. `date`)
    #[serde(rename = "type", default)]
    pub column_type: Option<String>,
    /// Raw JSON-encoded value, exactly as the API returns it
    #[serde(default)]
    pub value: Option<String>,
    /// Human-readable value
    #[serde(default)]
    pub text: Option<String>,
}

/// A subitem reference as returned under `items { subitems { ... } }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subitem {
    /// Subitem ID
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub id: Option<String>,
    /// Subitem name
    #[serde(default)]
    pub name: Option<String>,
    /// Board the subitem lives on
    #[serde(default)]
    pub board: Option<BoardRef>,
}

impl Subitem {
    /// Display name for logs.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown")
    }

    /// Board ID, if the board was returned.
    #[must_use]
    pub fn board_id(&self) -> Option<&str> {
        self.board.as_ref().and_then(|b| b.id.as_deref())
    }
}

/// Board reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardRef {
    /// Board ID
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub id: Option<String>,
}

/// Accept an identifier given as a JSON string or number.
///
/// Webhook payloads send numeric ids while GraphQL responses send strings.
pub fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(id_from_value(&Value::deserialize(deserializer)?))
}

/// Normalize a JSON id value to a string. Empty strings, `null` and other
/// shapes yield `None`.
#[must_use]
pub fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_deserialize_with_subitems() {
        let item: Item = serde_json::from_value(json!({
            "id": "100",
            "name": "Campaign",
            "column_values": [
                { "id": "date7", "value": "{\"date\":\"2024-05-01\"}", "text": "2024-05-01" }
            ],
            "subitems": [
                { "id": "201", "name": "Banner", "board": { "id": "900" } },
                { "id": 202, "name": null, "board": null }
            ]
        }))
        .unwrap();

        assert_eq!(item.id.as_deref(), Some("100"));
        assert_eq!(item.column_values.len(), 1);
        assert_eq!(
            item.column_values[0].value.as_deref(),
            Some("{\"date\":\"2024-05-01\"}")
        );
        assert_eq!(item.subitems.len(), 2);
        assert_eq!(item.subitems[0].board_id(), Some("900"));
        assert_eq!(item.subitems[1].id.as_deref(), Some("202"));
        assert_eq!(item.subitems[1].display_name(), "Unknown");
        assert!(item.subitems[1].board_id().is_none());
    }

    #[test]
    fn test_item_null_lists() {
        let item: Item = serde_json::from_value(json!({
            "id": "1",
            "column_values": null,
            "subitems": null
        }))
        .unwrap();
        assert!(item.column_values.is_empty());
        assert!(item.subitems.is_empty());
        assert_eq!(item.display_name(), "Unknown");
    }

    #[test]
    fn test_column_type_rename() {
        let col: ColumnValue =
            serde_json::from_value(json!({ "id": "date4", "type": "date", "value": null }))
                .unwrap();
        assert_eq!(col.column_type.as_deref(), Some("date"));
        assert!(col.value.is_none());
    }

    #[test]
    fn test_id_from_value() {
        assert_eq!(id_from_value(&json!(12345)), Some("12345".to_string()));
        assert_eq!(id_from_value(&json!("12345")), Some("12345".to_string()));
        assert_eq!(id_from_value(&json!("")), None);
        assert_eq!(id_from_value(&json!(null)), None);
        assert_eq!(id_from_value(&json!({ "id": 1 })), None);
    }
}

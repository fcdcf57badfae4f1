//! Webhook payload parsing and event classification.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::models::deserialize_opt_id;

/// Event type carried in `event.type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    /// Item (or subitem) created
    CreatePulse,
    /// A column value changed
    UpdateColumnValue,
    /// Anything else; ignored
    Other(String),
}

impl EventType {
    fn parse(raw: &str) -> Self {
        match raw {
            "create_pulse" => Self::CreatePulse,
            "update_column_value" => Self::UpdateColumnValue,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether this event type triggers a sync.
    #[must_use]
    pub fn is_sync_trigger(&self) -> bool {
        matches!(self, Self::CreatePulse | Self::UpdateColumnValue)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreatePulse => f.write_str("create_pulse"),
            Self::UpdateColumnValue => f.write_str("update_column_value"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

/// The `event` object of a monday.com webhook delivery.
///
/// Only the fields the sync uses are modelled; ids may arrive as numbers or strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Event type (`create_pulse`, `update_column_value`, ...)
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    /// Item ID
    #[serde(rename = "pulseId", default, deserialize_with = "deserialize_opt_id")]
    pub pulse_id: Option<String>,
    /// Item ID, snake-case variant
    #[serde(rename = "pulse_id", default, deserialize_with = "deserialize_opt_id")]
    pub pulse_id_snake: Option<String>,
    /// Item ID, as sent by some integrations
    #[serde(rename = "itemId", default, deserialize_with = "deserialize_opt_id")]
    pub item_id: Option<String>,
    /// Board the item lives on
    #[serde(rename = "boardId", default, deserialize_with = "deserialize_opt_id")]
    pub board_id: Option<String>,
    /// Parent item, present when the item is a subitem
    #[serde(
        rename = "parentItemId",
        default,
        deserialize_with = "deserialize_opt_id"
    )]
    pub parent_item_id: Option<String>,
    /// Board of the parent item
    #[serde(
        rename = "parentItemBoardId",
        default,
        deserialize_with = "deserialize_opt_id"
    )]
    pub parent_item_board_id: Option<String>,
    /// Column that changed, for `update_column_value`
    #[serde(rename = "columnId", default)]
    pub column_id: Option<String>,
    /// Item name
    #[serde(rename = "pulseName", default)]
    pub pulse_name: Option<String>,
}

impl WebhookEvent {
    /// Item ID, preferring `pulseId`, then `pulse_id`, then `itemId`.
    #[must_use]
    pub fn resolved_item_id(&self) -> Option<&str> {
        self.pulse_id
            .as_deref()
            .or(self.pulse_id_snake.as_deref())
            .or(self.item_id.as_deref())
    }

    /// Subitem ID, preferring `itemId`, then `pulseId`.
    #[must_use]
    pub fn resolved_subitem_id(&self) -> Option<&str> {
        self.item_id
            .as_deref()
            .or(self.pulse_id.as_deref())
            .or(self.pulse_id_snake.as_deref())
    }
}

/// A parent item changed or was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentUpdate {
    pub event_type: EventType,
    pub item_id: Option<String>,
    pub column_id: Option<String>,
    pub item_name: Option<String>,
}

/// A subitem was created (or changed) under a parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubitemLink {
    pub event_type: EventType,
    pub subitem_id: Option<String>,
    pub subitem_board_id: Option<String>,
    pub parent_item_id: Option<String>,
    pub parent_board_id: Option<String>,
}

/// The four identifiers the subitem path needs, all present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubitemIds<'a> {
    pub subitem_id: &'a str,
    pub subitem_board_id: &'a str,
    pub parent_item_id: &'a str,
    pub parent_board_id: &'a str,
}

impl SubitemLink {
    /// All four identifiers, or `None` if any is missing.
    #[must_use]
    pub fn ids(&self) -> Option<SubitemIds<'_>> {
        Some(SubitemIds {
            subitem_id: self.subitem_id.as_deref()?,
            subitem_board_id: self.subitem_board_id.as_deref()?,
            parent_item_id: self.parent_item_id.as_deref()?,
            parent_board_id: self.parent_board_id.as_deref()?,
        })
    }
}

/// Classified inbound delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Webhook registration handshake; echo the payload back.
    Challenge,
    /// Parent → subitems sync.
    ParentUpdated(ParentUpdate),
    /// Subitem ← parent sync.
    SubitemCreated(SubitemLink),
    /// Not an event we act on.
    Ignored { event_type: Option<String> },
}

/// Classify a parsed webhook body.
///
/// Fails only when the `event` object has fields of the wrong JSON type.
pub fn classify(body: &Value) -> Result<Inbound, serde_json::Error> {
    if body.get("challenge").is_some() {
        return Ok(Inbound::Challenge);
    }

    let event: WebhookEvent = match body.get("event") {
        Some(event) if !event.is_null() => WebhookEvent::deserialize(event)?,
        _ => WebhookEvent::default(),
    };

    let Some(raw_type) = event.event_type.as_deref() else {
        return Ok(Inbound::Ignored { event_type: None });
    };

    let event_type = EventType::parse(raw_type);
    if !event_type.is_sync_trigger() {
        return Ok(Inbound::Ignored {
            event_type: Some(raw_type.to_string()),
        });
    }

    if event.parent_item_id.is_some() {
        return Ok(Inbound::SubitemCreated(SubitemLink {
            event_type,
            subitem_id: event.resolved_subitem_id().map(str::to_string),
            subitem_board_id: event.board_id,
            parent_item_id: event.parent_item_id,
            parent_board_id: event.parent_item_board_id,
        }));
    }

    Ok(Inbound::ParentUpdated(ParentUpdate {
        event_type,
        item_id: event.resolved_item_id().map(str::to_string),
        column_id: event.column_id,
        item_name: event.pulse_name,
    }))
}

//! Date synchronization between parent items and their subitems.
//!
//! Two paths, both strictly sequential:
//! - parent → subitems: a parent's "Creative Deadline" is copied to every subitem
//! - subitem ← parent: a newly created subitem picks up its parent's date
//!
//! Data that is missing remotely (item, column, date) is a [`SyncOutcome::Skipped`],
//! not an error. Failed reads surface as [`ApiError`]; failed writes are
//! recorded in [`SyncOutcome::Synced`] and never abort the delivery.

use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

use crate::client::MondayClient;
use crate::columns::{
    date_text, date_value, locate_date_column, present_value, PARENT_DATE_COLUMN_ID,
    SUBITEM_DATE_COLUMN_ID,
};
use crate::config::FallbackDate;
use crate::error::ApiError;
use crate::webhooks::{ParentUpdate, SubitemLink};

/// Result of one sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Mutations were issued.
    Synced {
        /// Subitems whose date column was written
        updated: usize,
        /// Subitems whose update failed
        #[serde(skip_serializing_if = "Vec::is_empty")]
        failed: Vec<SubitemFailure>,
    },
    /// Nothing to do.
    Skipped { reason: SkipReason },
}

impl SyncOutcome {
    fn skipped(reason: SkipReason) -> Self {
        Self::Skipped { reason }
    }
}

/// Why a sync did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Event carried no item id
    MissingItemId,
    /// Subitem event lacked one of its four identifiers
    MissingIdentifiers,
    ParentNotFound,
    SubitemNotFound,
    ParentDateColumnNotFound,
    SubitemDateColumnNotFound,
    /// Parent date empty or `null` and no fallback applies
    EmptyDate,
    NoSubitems,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::MissingItemId => "missing item id in webhook data",
            Self::MissingIdentifiers => "missing required ids for subitem-parent sync",
            Self::ParentNotFound => "parent item not found",
            Self::SubitemNotFound => "subitem not found",
            Self::ParentDateColumnNotFound => "no date column on parent item",
            Self::SubitemDateColumnNotFound => "no date column on subitem",
            Self::EmptyDate => "no date value to sync",
            Self::NoSubitems => "no subitems found",
        };
        f.write_str(text)
    }
}

/// A subitem update that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubitemFailure {
    pub subitem_id: String,
    pub error: String,
}

/// Copy the parent's "Creative Deadline" onto every subitem.
///
/// Each subitem is updated on its own board, one at a time. A failed update
/// is recorded and the loop moves on.
pub async fn sync_parent_to_subitems(
    client: &MondayClient,
    update: &ParentUpdate,
) -> Result<SyncOutcome, ApiError> {
    let Some(item_id) = update.item_id.as_deref() else {
        return Ok(SyncOutcome::skipped(SkipReason::MissingItemId));
    };

    info!(item_id = %item_id, "Syncing parent date to subitems");

    let Some(parent) = client
        .get_item_with_subitems(item_id, PARENT_DATE_COLUMN_ID)
        .await?
    else {
        return Ok(SyncOutcome::skipped(SkipReason::ParentNotFound));
    };

    let Some(date_column) = parent
        .column_values
        .iter()
        .find(|c| c.id == PARENT_DATE_COLUMN_ID)
    else {
        return Ok(SyncOutcome::skipped(SkipReason::ParentDateColumnNotFound));
    };

    info!(
        parent = %parent.display_name(),
        date = %date_column.text.as_deref().unwrap_or_default(),
        "Parent date"
    );

    let Some(value) = present_value(date_column.value.as_deref()) else {
        return Ok(SyncOutcome::skipped(SkipReason::EmptyDate));
    };

    if parent.subitems.is_empty() {
        return Ok(SyncOutcome::skipped(SkipReason::NoSubitems));
    }

    info!(count = parent.subitems.len(), "Updating subitems");

    let mut updated = 0;
    let mut failed = Vec::new();

    for subitem in &parent.subitems {
        let (Some(subitem_id), Some(board_id)) = (subitem.id.as_deref(), subitem.board_id())
        else {
            debug!(subitem = %subitem.display_name(), "Subitem without id or board, skipping");
            continue;
        };

        match client
            .change_column_value(board_id, subitem_id, SUBITEM_DATE_COLUMN_ID, value)
            .await
        {
            Ok(_) => {
                info!(subitem = %subitem.display_name(), subitem_id = %subitem_id, "Updated subitem");
                updated += 1;
            }
            Err(e) => {
                warn!(
                    subitem = %subitem.display_name(),
                    subitem_id = %subitem_id,
                    error = %e,
                    "Failed to update subitem"
                );
                failed.push(SubitemFailure {
                    subitem_id: subitem_id.to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(SyncOutcome::Synced { updated, failed })
}

/// Copy the parent's date onto a subitem.
///
/// Both date columns are located by their known id, falling back to the
/// first column of type `date`. When the parent has no date, `fallback`
/// (resolved against the current year) is written instead, if configured.
/// A failed write is logged and reported in the outcome, not returned as an error.
pub async fn sync_subitem_from_parent(
    client: &MondayClient,
    link: &SubitemLink,
    fallback: Option<FallbackDate>,
) -> Result<SyncOutcome, ApiError> {
    let Some(ids) = link.ids() else {
        warn!(?link, "Missing required ids for subitem-parent sync");
        return Ok(SyncOutcome::skipped(SkipReason::MissingIdentifiers));
    };

    info!(
        subitem_id = %ids.subitem_id,
        subitem_board_id = %ids.subitem_board_id,
        parent_item_id = %ids.parent_item_id,
        parent_board_id = %ids.parent_board_id,
        "Syncing subitem with parent"
    );

    let parent = client.get_item_columns(ids.parent_item_id).await?;
    let subitem = client.get_item_columns(ids.subitem_id).await?;

    let Some(parent) = parent else {
        return Ok(SyncOutcome::skipped(SkipReason::ParentNotFound));
    };
    let Some(parent_column) = locate_date_column(&parent.column_values, PARENT_DATE_COLUMN_ID)
    else {
        return Ok(SyncOutcome::skipped(SkipReason::ParentDateColumnNotFound));
    };
    debug!(
        parent = %parent.display_name(),
        column_id = %parent_column.column.id,
        matched_by = ?parent_column.matched_by,
        "Found parent date column"
    );

    let Some(subitem) = subitem else {
        return Ok(SyncOutcome::skipped(SkipReason::SubitemNotFound));
    };
    let Some(subitem_column) = locate_date_column(&subitem.column_values, SUBITEM_DATE_COLUMN_ID)
    else {
        return Ok(SyncOutcome::skipped(SkipReason::SubitemDateColumnNotFound));
    };
    debug!(
        subitem = %subitem.display_name(),
        column_id = %subitem_column.column.id,
        matched_by = ?subitem_column.matched_by,
        "Found subitem date column"
    );

    let value = match present_value(parent_column.column.value.as_deref()) {
        Some(raw) => {
            info!(date = %date_text(raw).unwrap_or_else(|| raw.to_string()), "Parent date value");
            raw.to_string()
        }
        None => {
            let Some(date) = fallback.and_then(FallbackDate::this_year) else {
                return Ok(SyncOutcome::skipped(SkipReason::EmptyDate));
            };
            warn!(date = %date, "Parent date is empty, writing configured fallback date");
            date_value(date)
        }
    };

    if let Err(e) = client
        .change_column_value(
            ids.subitem_board_id,
            ids.subitem_id,
            &subitem_column.column.id,
            &value,
        )
        .await
    {
        warn!(subitem_id = %ids.subitem_id, error = %e, "Failed to update subitem date");
        return Ok(SyncOutcome::Synced {
            updated: 0,
            failed: vec![SubitemFailure {
                subitem_id: ids.subitem_id.to_string(),
                error: e.to_string(),
            }],
        });
    }

    info!(subitem_id = %ids.subitem_id, "Updated subitem date from parent");

    Ok(SyncOutcome::Synced {
        updated: 1,
        failed: Vec::new(),
    })
}

use dokkai_core::model::ReviewItem;
use sqlx::Row;

use crate::repository::{ReviewItemRecord, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn map_review_item_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<ReviewItem, StorageError> {
    ReviewItemRecord {
        id: row.try_get("id").map_err(ser)?,
        kind: row.try_get("kind").map_err(ser)?,
        content: row.try_get("content").map_err(ser)?,
        text_entry_id: row.try_get("text_entry_id").map_err(ser)?,
        srs_stage: row.try_get("srs_stage").map_err(ser)?,
        interval_modifier: row.try_get("interval_modifier").map_err(ser)?,
        incorrect_answer_count: row.try_get("incorrect_answer_count").map_err(ser)?,
        next_review_ms: row.try_get("next_review_date").map_err(ser)?,
        added_at_ms: row.try_get("added_at").map_err(ser)?,
    }
    .into_item()
}

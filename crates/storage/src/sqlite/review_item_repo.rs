use async_trait::async_trait;
use dokkai_core::model::{ReviewItem, ReviewItemId};

use crate::repository::{ReviewItemRecord, ReviewItemRepository, StorageError};

use super::SqliteRepository;
use super::mapping::{conn, map_review_item_row};

#[async_trait]
impl ReviewItemRepository for SqliteRepository {
    async fn get_all_review_items(&self) -> Result<Vec<ReviewItem>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT
                id, kind, content, text_entry_id, srs_stage, interval_modifier,
                incorrect_answer_count, next_review_date, added_at
            FROM review_items
            ORDER BY added_at ASC, id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_review_item_row).collect()
    }

    async fn upsert_review_item(&self, item: &ReviewItem) -> Result<(), StorageError> {
        let record = ReviewItemRecord::from_item(item)?;
        sqlx::query(
            r"
            INSERT INTO review_items (
                id, kind, content, text_entry_id, srs_stage, interval_modifier,
                incorrect_answer_count, next_review_date, added_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
                kind = excluded.kind,
                content = excluded.content,
                text_entry_id = excluded.text_entry_id,
                srs_stage = excluded.srs_stage,
                interval_modifier = excluded.interval_modifier,
                incorrect_answer_count = excluded.incorrect_answer_count,
                next_review_date = excluded.next_review_date,
                added_at = excluded.added_at
            ",
        )
        .bind(&record.id)
        .bind(&record.kind)
        .bind(&record.content)
        .bind(record.text_entry_id.as_deref())
        .bind(record.srs_stage)
        .bind(record.interval_modifier)
        .bind(record.incorrect_answer_count)
        .bind(record.next_review_ms)
        .bind(record.added_at_ms)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn delete_review_item(&self, id: &ReviewItemId) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM review_items WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}

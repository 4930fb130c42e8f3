use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
    let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
        .bind(version)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

/// Applies versioned migrations in order, skipping ones already recorded.
///
/// Version 1 holds review items and both settings tables; version 2 adds the
/// analysis cache.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS review_items (
                    id TEXT PRIMARY KEY,
                    kind TEXT NOT NULL CHECK (kind IN ('word', 'grammar')),
                    content TEXT NOT NULL,
                    text_entry_id TEXT,
                    srs_stage INTEGER NOT NULL CHECK (srs_stage BETWEEN 0 AND 9),
                    interval_modifier REAL,
                    incorrect_answer_count INTEGER NOT NULL DEFAULT 0
                        CHECK (incorrect_answer_count >= 0),
                    next_review_date INTEGER NOT NULL,
                    added_at INTEGER NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_review_items_stage_next_review
                    ON review_items (srs_stage, next_review_date);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS study_settings (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    new_words_per_day INTEGER NOT NULL CHECK (new_words_per_day >= 0),
                    chunk_size INTEGER NOT NULL CHECK (chunk_size > 0)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS app_settings (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    api_key TEXT,
                    api_model TEXT,
                    api_base_url TEXT
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        record_version(&mut tx, 1).await?;
        tx.commit().await?;
        tracing::info!(version = 1, "applied sqlite migration");
    }

    if !is_applied(pool, 2).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS analysis_cache (
                    cache_key TEXT PRIMARY KEY,
                    payload TEXT NOT NULL,
                    stored_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        record_version(&mut tx, 2).await?;
        tx.commit().await?;
        tracing::info!(version = 2, "applied sqlite migration");
    }

    Ok(())
}

async fn record_version(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    version: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
            INSERT INTO schema_migrations (version, applied_at)
            VALUES (?1, ?2)
            ON CONFLICT(version) DO NOTHING
        ",
    )
    .bind(version)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

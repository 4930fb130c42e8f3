use chrono::Duration;
use dokkai_core::model::{
    AppSettingsDraft, GrammarContent, ReviewItem, ReviewItemId, ReviewQuality, SrsStage,
    StudySettings, TextEntryId, WordContent,
};
use dokkai_core::scheduler::calculate_next_review;
use dokkai_core::time::fixed_now;
use storage::repository::{ReviewItemRepository, Storage};
use storage::sqlite::SqliteRepository;

fn word(id: &str, minutes: i64) -> ReviewItem {
    ReviewItem::new(
        ReviewItemId::new(id),
        WordContent::new("猫", "ねこ", "cat")
            .with_part_of_speech("noun")
            .with_pitch_accent(1),
        Some(TextEntryId::new("entry-1")),
        fixed_now() + Duration::minutes(minutes),
    )
    .unwrap()
}

#[tokio::test]
async fn sqlite_roundtrip_preserves_scheduling_fields() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let item = word("w1", 0);
    let reviewed = calculate_next_review(&item, ReviewQuality::Easy, fixed_now());
    let reviewed = calculate_next_review(&reviewed, ReviewQuality::Again, fixed_now());
    repo.upsert_review_item(&reviewed).await.unwrap();

    let grammar = ReviewItem::new(
        ReviewItemId::new("g1"),
        GrammarContent::new("〜ながら", "while doing")
            .with_example("歩きながら話す", Some("talk while walking".into())),
        None,
        fixed_now() + Duration::minutes(5),
    )
    .unwrap();
    repo.upsert_review_item(&grammar).await.unwrap();

    let all = repo.get_all_review_items().await.unwrap();
    assert_eq!(all, vec![reviewed.clone(), grammar]);
    assert_eq!(all[0].srs_stage(), SrsStage::FIRST);
    assert_eq!(all[0].incorrect_answer_count(), 1);
    assert!((all[0].interval_modifier() - 0.95).abs() < 1e-9);
}

#[tokio::test]
async fn sqlite_upsert_replaces_and_delete_is_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_upsert?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    // Running migrations twice is a no-op.
    repo.migrate().await.expect("migrate again");

    let item = word("w1", 0);
    repo.upsert_review_item(&item).await.unwrap();
    let reviewed = calculate_next_review(&item, ReviewQuality::Good, fixed_now());
    repo.upsert_review_item(&reviewed).await.unwrap();

    let all = repo.get_all_review_items().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].srs_stage(), SrsStage::FIRST);

    repo.delete_review_item(item.id()).await.unwrap();
    repo.delete_review_item(&ReviewItemId::new("missing"))
        .await
        .unwrap();
    assert!(repo.get_all_review_items().await.unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_legacy_row_without_modifier_loads_default() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_legacy?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    sqlx::query(
        r#"
        INSERT INTO review_items (
            id, kind, content, text_entry_id, srs_stage, interval_modifier,
            incorrect_answer_count, next_review_date, added_at
        )
        VALUES ('old', 'word', '{"word":"犬","reading":"いぬ","meaning":"dog"}', NULL, 3, NULL, 0, ?1, ?1)
        "#,
    )
    .bind(fixed_now().timestamp_millis())
    .execute(repo.pool())
    .await
    .unwrap();

    let all = repo.get_all_review_items().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].interval_modifier(), 1.0);
    assert_eq!(all[0].srs_stage().value(), 3);
    assert!(all[0].is_due(fixed_now()));
}

#[tokio::test]
async fn sqlite_settings_and_cache_round_trip() {
    let storage = Storage::sqlite("sqlite:file:memdb_settings?mode=memory&cache=shared")
        .await
        .expect("storage");

    assert!(storage.settings.get_study_settings().await.unwrap().is_none());
    assert!(storage.settings.get_app_settings().await.unwrap().is_none());

    let study = StudySettings::new(15, 4).unwrap();
    storage.settings.save_study_settings(&study).await.unwrap();
    assert_eq!(
        storage.settings.get_study_settings().await.unwrap(),
        Some(study)
    );

    let app = AppSettingsDraft {
        api_key: Some("sk-test".into()),
        api_model: Some("gpt-4o-mini".into()),
        api_base_url: Some("https://api.example.com/v1".into()),
    }
    .validate()
    .unwrap();
    storage.settings.save_app_settings(&app).await.unwrap();
    assert_eq!(
        storage.settings.get_app_settings().await.unwrap(),
        Some(app)
    );

    let key = "detailed:今日は雨です。";
    assert!(storage.analyses.get_cached_analysis(key).await.unwrap().is_none());
    storage
        .analyses
        .put_cached_analysis(key, r#"{"sentence":"今日は雨です。"}"#)
        .await
        .unwrap();
    storage
        .analyses
        .put_cached_analysis(key, r#"{"sentence":"今日は雨です。","v":2}"#)
        .await
        .unwrap();
    assert_eq!(
        storage.analyses.get_cached_analysis(key).await.unwrap().as_deref(),
        Some(r#"{"sentence":"今日は雨です。","v":2}"#)
    );
}

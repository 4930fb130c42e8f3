use chrono::Duration;
use dokkai_core::model::{ReviewQuality, SrsStage, TextEntryId};
use dokkai_core::time::fixed_now;
use services::analysis::{GrammarPoint, Segment};
use services::{AppServices, Clock, LearningPhase, SessionMode};

fn segment(text: &str, reading: &str, meaning: &str) -> Segment {
    Segment {
        text: text.into(),
        reading: Some(reading.into()),
        meaning: Some(meaning.into()),
        part_of_speech: None,
        pitch_accent: None,
    }
}

#[tokio::test]
async fn learn_then_review_persists_every_step() {
    let day_one = fixed_now();
    let services = AppServices::new_sqlite(
        "sqlite:file:memdb_session_smoke?mode=memory&cache=shared",
        Clock::fixed(day_one),
    )
    .await
    .expect("services");

    services
        .settings()
        .save_study_settings(10, 2)
        .await
        .unwrap();

    let entry = TextEntryId::new("article-1");
    let decks = services.deck_service();
    for (text, reading, meaning) in [
        ("天気", "てんき", "weather"),
        ("予報", "よほう", "forecast"),
        ("傘", "かさ", "umbrella"),
    ] {
        decks
            .add_word(&segment(text, reading, meaning), Some(entry.clone()))
            .await
            .unwrap();
    }
    decks
        .add_grammar(
            &GrammarPoint {
                pattern: "〜そうだ".into(),
                explanation: "hearsay".into(),
                example: None,
            },
            None,
        )
        .await
        .unwrap();

    let loop_svc = services.session_loop();
    let mut session = loop_svc
        .start_session(Some(entry.clone()))
        .await
        .unwrap();
    assert_eq!(session.mode(), SessionMode::Start);
    assert_eq!(session.learning_chunks().len(), 2);

    session.start_learning().unwrap();
    while session.mode() != SessionMode::Complete {
        match session.mode() {
            SessionMode::Learning(LearningPhase::Study) => session.next_study_card().unwrap(),
            SessionMode::Learning(LearningPhase::Quiz) => {
                let id = session.current_item().unwrap().id().clone();
                let result = loop_svc.answer_quiz(&mut session, &id, true).await.unwrap();
                assert!(!result.sync.is_failed());
            }
            SessionMode::Learning(LearningPhase::ChunkComplete) => {
                session.continue_after_chunk().unwrap();
            }
            other => panic!("unexpected mode {other:?}"),
        }
    }
    let stats = session.exit();
    assert_eq!(stats.learned, 4);

    let stored = decks.list_items().await.unwrap();
    assert_eq!(stored.len(), 4);
    assert!(stored.iter().all(|item| item.srs_stage() == SrsStage::FIRST));

    // Four hours later everything learned is due for its first review.
    let later = AppServices::new_sqlite(
        "sqlite:file:memdb_session_smoke?mode=memory&cache=shared",
        Clock::fixed(day_one + Duration::hours(4)),
    )
    .await
    .expect("services");
    let loop_svc = later.session_loop();
    let mut session = loop_svc.start_session(None).await.unwrap();
    assert_eq!(session.plan().due_items.len(), 4);

    session.start_reviewing().unwrap();
    let first = loop_svc
        .answer_review(&mut session, ReviewQuality::Again)
        .await
        .unwrap();
    assert_eq!(first.updated.as_ref().unwrap().incorrect_answer_count(), 1);
    while session.mode() == SessionMode::Review {
        loop_svc
            .answer_review(&mut session, ReviewQuality::Good)
            .await
            .unwrap();
    }
    assert_eq!(session.mode(), SessionMode::Complete);

    let stored = later.deck_service().list_items().await.unwrap();
    let stages: Vec<u8> = stored.iter().map(|i| i.srs_stage().value()).collect();
    assert_eq!(stages.iter().filter(|s| **s == 2).count(), 3);
    assert_eq!(stages.iter().filter(|s| **s == 1).count(), 1);
}

#[tokio::test]
async fn manage_delete_removes_from_store() {
    let services = AppServices::new_sqlite(
        "sqlite:file:memdb_manage_smoke?mode=memory&cache=shared",
        Clock::fixed(fixed_now()),
    )
    .await
    .expect("services");
    let item = services
        .deck_service()
        .add_word(&segment("海", "うみ", "sea"), None)
        .await
        .unwrap();

    let loop_svc = services.session_loop();
    let mut session = loop_svc.start_session(None).await.unwrap();
    session.enter_manage().unwrap();
    loop_svc.delete_item(&mut session, item.id()).await.unwrap();
    session.exit_manage().unwrap();

    assert_eq!(session.mode(), SessionMode::Empty);
    assert!(services.deck_service().list_items().await.unwrap().is_empty());
}

#[tokio::test]
async fn grading_by_id_persists_through_app_services() {
    let services = AppServices::new_sqlite(
        "sqlite:file:memdb_grade_smoke?mode=memory&cache=shared",
        Clock::fixed(fixed_now()),
    )
    .await
    .expect("services");
    let item = services
        .deck_service()
        .add_word(&segment("雪", "ゆき", "snow"), None)
        .await
        .unwrap();

    let review = services
        .review_service()
        .review_item_persisted_by_id(
            item.id(),
            ReviewQuality::Easy,
            services.storage().review_items.as_ref(),
        )
        .await
        .unwrap();
    assert_eq!(review.previous.srs_stage(), SrsStage::NEW);
    assert_eq!(review.item.srs_stage(), SrsStage::FIRST);

    let stored = services.deck_service().list_items().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id(), review.item.id());
    assert_eq!(stored[0].srs_stage(), SrsStage::FIRST);
}

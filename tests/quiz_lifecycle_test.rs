// tests/quiz_lifecycle_test.rs
// Session start / resume / reset / clean behavior

mod common;

use common::{count, seed, setup, CallKind};
use oaktree::error::OakError;
use oaktree::quiz::AnswerType;
use oaktree::session::{ConceptStatus, Phase, SessionStatus, SessionStore};

// ============================================================================
// START AND RESUME
// ============================================================================

#[tokio::test]
async fn test_second_start_resumes_without_regenerating() {
    let env = setup().await;
    let s = seed(&env, &["Photosynthesis", "Respiration"]).await;
    let quiz = &env.state.quiz;

    let first = quiz.start_session(&s.student.id, &s.lesson.id).await.unwrap();
    assert!(!first.resumed);
    assert_eq!(first.progress.current, 1);
    assert_eq!(first.progress.total, 2);
    assert_eq!(first.progress.percentage, 0);
    assert_eq!(first.current_phase, Phase::MultipleChoice);
    assert_eq!(first.current_question.as_ref().unwrap().concept, "Photosynthesis");

    let second = quiz.start_session(&s.student.id, &s.lesson.id).await.unwrap();
    assert!(second.resumed);
    assert_eq!(second.session_id, first.session_id);
    assert_eq!(env.llm.calls(CallKind::Questions), 1);

    // exactly one opening question message
    let messages = quiz.messages(&first.session_id).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].body.kind(), "multiple_choice");
}

#[tokio::test]
async fn test_resume_returns_stored_phase_and_progress() {
    let env = setup().await;
    let s = seed(&env, &["A", "B", "C"]).await;
    let quiz = &env.state.quiz;

    let start = quiz.start_session(&s.student.id, &s.lesson.id).await.unwrap();
    quiz.submit_answer(&start.session_id, "b", AnswerType::MultipleChoice)
        .await
        .unwrap();
    quiz.submit_answer(&start.session_id, "Boiling pasta", AnswerType::Example)
        .await
        .unwrap();
    quiz.submit_answer(&start.session_id, "b", AnswerType::MultipleChoice)
        .await
        .unwrap();

    let resumed = quiz.start_session(&s.student.id, &s.lesson.id).await.unwrap();
    assert!(resumed.resumed);
    assert_eq!(resumed.current_phase, Phase::Example);
    assert_eq!(resumed.current_question.unwrap().question_index, 1);
    assert_eq!(resumed.progress.current, 2);
    assert_eq!(resumed.progress.percentage, 33);
}

#[tokio::test]
async fn test_lesson_without_concepts_is_not_ready() {
    let env = setup().await;
    let s = seed(&env, &[]).await;

    let err = env
        .state
        .quiz
        .start_session(&s.student.id, &s.lesson.id)
        .await
        .unwrap_err();
    assert!(matches!(err, OakError::LessonNotReady));

    let sessions = count(
        &env.pool,
        "SELECT COUNT(*) FROM chat_sessions WHERE lesson_id = ?",
        &s.lesson.id,
    )
    .await;
    assert_eq!(sessions, 0);
    assert_eq!(env.llm.calls(CallKind::Questions), 0);
}

#[tokio::test]
async fn test_unknown_lesson_is_not_found() {
    let env = setup().await;
    let s = seed(&env, &["A"]).await;
    let err = env
        .state
        .quiz
        .start_session(&s.student.id, "no-such-lesson")
        .await
        .unwrap_err();
    assert!(matches!(err, OakError::NotFound(_)));
}

#[tokio::test]
async fn test_unknown_student_is_not_found() {
    let env = setup().await;
    let s = seed(&env, &["A"]).await;
    let err = env
        .state
        .quiz
        .start_session("no-such-student", &s.lesson.id)
        .await
        .unwrap_err();
    assert!(matches!(err, OakError::NotFound(_)));
    assert_eq!(err.to_string(), "student not found");

    let sessions = count(
        &env.pool,
        "SELECT COUNT(*) FROM chat_sessions WHERE lesson_id = ?",
        &s.lesson.id,
    )
    .await;
    assert_eq!(sessions, 0);
    assert_eq!(env.llm.calls(CallKind::Questions), 0);
}

#[tokio::test]
async fn test_malformed_question_output_fails_start() {
    let env = setup().await;
    let s = seed(&env, &["A", "B"]).await;
    env.llm.set_questions(Some("Here are some questions: none".to_string()));

    let err = env
        .state
        .quiz
        .start_session(&s.student.id, &s.lesson.id)
        .await
        .unwrap_err();
    assert!(matches!(err, OakError::GenerationFailed(_)));
}

#[tokio::test]
async fn test_stateless_active_session_gets_questions_but_no_opening_message() {
    let env = setup().await;
    let s = seed(&env, &["A"]).await;

    // a failed generation leaves an active session without state
    env.llm.set_questions(None);
    assert!(env
        .state
        .quiz
        .start_session(&s.student.id, &s.lesson.id)
        .await
        .is_err());

    env.llm.set_questions(Some(common::questions_json(&["A"])));
    let start = env
        .state
        .quiz
        .start_session(&s.student.id, &s.lesson.id)
        .await
        .unwrap();
    assert!(!start.resumed);
    assert_eq!(env.llm.calls(CallKind::Questions), 2);
    assert!(env.state.quiz.messages(&start.session_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_second_active_session_is_a_conflict() {
    let env = setup().await;
    let s = seed(&env, &["A"]).await;
    let store = SessionStore::new(env.pool.clone());

    store.create(&s.student.id, &s.lesson.id).await.unwrap();
    let err = store.create(&s.student.id, &s.lesson.id).await.unwrap_err();
    assert!(matches!(err, OakError::Conflict(_)));
}

// ============================================================================
// COMPLETION, RESET AND CLEAN
// ============================================================================

#[tokio::test]
async fn test_completed_session_leads_to_fresh_session() {
    let env = setup().await;
    let s = seed(&env, &["A", "B"]).await;
    let quiz = &env.state.quiz;

    let start = quiz.start_session(&s.student.id, &s.lesson.id).await.unwrap();
    for _ in 0..2 {
        quiz.submit_answer(&start.session_id, "b", AnswerType::MultipleChoice)
            .await
            .unwrap();
        quiz.submit_answer(&start.session_id, "An example", AnswerType::Example)
            .await
            .unwrap();
    }

    let view = quiz.session_view(&start.session_id).await.unwrap();
    assert!(view.is_complete);
    assert_eq!(view.status, SessionStatus::Completed);

    let again = quiz.start_session(&s.student.id, &s.lesson.id).await.unwrap();
    assert!(!again.resumed);
    assert_ne!(again.session_id, start.session_id);
    assert_eq!(env.llm.calls(CallKind::Questions), 2);
}

#[tokio::test]
async fn test_reset_keeps_questions_and_erases_history() {
    let env = setup().await;
    let s = seed(&env, &["A", "B"]).await;
    let quiz = &env.state.quiz;
    let store = SessionStore::new(env.pool.clone());

    let start = quiz.start_session(&s.student.id, &s.lesson.id).await.unwrap();
    quiz.submit_answer(&start.session_id, "a", AnswerType::MultipleChoice)
        .await
        .unwrap();
    quiz.submit_answer(&start.session_id, "b", AnswerType::MultipleChoice)
        .await
        .unwrap();
    let before = store.get(&start.session_id).await.unwrap().unwrap();
    let questions_before = serde_json::to_string(&before.state.unwrap().questions).unwrap();

    let reset = quiz.reset_session(&s.student.id, &s.lesson.id).await.unwrap();
    assert_eq!(reset.session_id, start.session_id);
    assert_eq!(reset.question_count, 2);

    let after = store.get(&start.session_id).await.unwrap().unwrap();
    let state = after.state.unwrap();
    assert_eq!(serde_json::to_string(&state.questions).unwrap(), questions_before);
    assert_eq!(state.current_question_index, 0);
    assert_eq!(state.current_phase, Phase::MultipleChoice);
    assert_eq!(after.status, SessionStatus::Active);

    let attempts = count(
        &env.pool,
        "SELECT COUNT(*) FROM multiple_choice_attempts WHERE session_id = ?",
        &start.session_id,
    )
    .await;
    assert_eq!(attempts, 0);
    let hints = count(
        &env.pool,
        "SELECT COUNT(*) FROM dynamic_hints WHERE session_id = ?",
        &start.session_id,
    )
    .await;
    assert_eq!(hints, 0);

    // only the re-sent opening question remains
    let messages = quiz.messages(&start.session_id).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].body.kind(), "multiple_choice");
    assert_eq!(env.llm.calls(CallKind::Questions), 1);
}

#[tokio::test]
async fn test_reset_reopens_completed_session() {
    let env = setup().await;
    let s = seed(&env, &["A"]).await;
    let quiz = &env.state.quiz;

    let start = quiz.start_session(&s.student.id, &s.lesson.id).await.unwrap();
    quiz.submit_answer(&start.session_id, "b", AnswerType::MultipleChoice)
        .await
        .unwrap();
    quiz.submit_answer(&start.session_id, "Salt in water", AnswerType::Example)
        .await
        .unwrap();

    quiz.reset_session(&s.student.id, &s.lesson.id).await.unwrap();
    let view = quiz.session_view(&start.session_id).await.unwrap();
    assert_eq!(view.status, SessionStatus::Active);
    assert!(!view.is_complete);
}

#[tokio::test]
async fn test_reset_without_session_or_questions() {
    let env = setup().await;
    let s = seed(&env, &["A"]).await;
    let quiz = &env.state.quiz;

    let err = quiz.reset_session(&s.student.id, &s.lesson.id).await.unwrap_err();
    assert!(matches!(err, OakError::NotFound(_)));

    SessionStore::new(env.pool.clone())
        .create(&s.student.id, &s.lesson.id)
        .await
        .unwrap();
    let err = quiz.reset_session(&s.student.id, &s.lesson.id).await.unwrap_err();
    assert!(matches!(err, OakError::NoQuestionsToReset));
}

#[tokio::test]
async fn test_clean_archives_without_deleting() {
    let env = setup().await;
    let s = seed(&env, &["A"]).await;
    let quiz = &env.state.quiz;

    let start = quiz.start_session(&s.student.id, &s.lesson.id).await.unwrap();
    quiz.submit_answer(&start.session_id, "c", AnswerType::MultipleChoice)
        .await
        .unwrap();

    assert_eq!(quiz.clean_sessions(&s.student.id, &s.lesson.id).await.unwrap(), 1);
    let view = quiz.session_view(&start.session_id).await.unwrap();
    assert_eq!(view.status, SessionStatus::Completed);
    assert!(!quiz.messages(&start.session_id).await.unwrap().is_empty());

    let next = quiz.start_session(&s.student.id, &s.lesson.id).await.unwrap();
    assert_ne!(next.session_id, start.session_id);
    assert_eq!(env.llm.calls(CallKind::Questions), 2);
}

#[tokio::test]
async fn test_view_tracks_concepts_and_hints() {
    let env = setup().await;
    let s = seed(&env, &["A", "B"]).await;
    let quiz = &env.state.quiz;

    let start = quiz.start_session(&s.student.id, &s.lesson.id).await.unwrap();
    let view = quiz.session_view(&start.session_id).await.unwrap();
    assert_eq!(view.concepts.len(), 1);
    assert_eq!(view.concepts[0].status, ConceptStatus::MultipleChoice);
    assert!(view.hints.is_empty());

    quiz.submit_answer(&start.session_id, "a", AnswerType::MultipleChoice)
        .await
        .unwrap();
    quiz.submit_answer(&start.session_id, "b", AnswerType::MultipleChoice)
        .await
        .unwrap();

    let view = quiz.session_view(&start.session_id).await.unwrap();
    assert_eq!(view.concepts[0].concept, "A");
    assert_eq!(view.concepts[0].status, ConceptStatus::Example);
    assert_eq!(view.hints.len(), 1);
    assert_eq!(view.hints[0].concept, "A");
    assert_eq!(view.hints[0].phase, "multiple_choice");
}

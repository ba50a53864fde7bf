//! Lifecycle of a single timed test attempt.
//!
//! A session moves `NotStarted -> InProgress -> Finished` and never back.
//! While in progress a spawned countdown task decrements the remaining
//! seconds once per second and forces a finish when they run out. Scoring
//! happens locally from the in-memory answer map, so a finished attempt
//! always produces a score even when recording progress afterwards fails.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use common::events::ItemKind;
use db::gateway::{GatewayError, PersistenceGateway};
use engine::check;
use engine::scorer;
use engine::types::{AnswerMap, Question, TestScore, Variant};
use log::{error, warn};
use sea_orm::DatabaseConnection;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::interval;

use crate::progress_service::ProgressService;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to load test: {0}")]
    Load(#[from] GatewayError),
    #[error("test session already started")]
    AlreadyStarted,
    #[error("test session has not been started")]
    NotStarted,
    #[error("test session is no longer in progress")]
    NotInProgress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    InProgress,
    Finished,
}

/// Identifies the playlist a test is being taken inside of, if any.
/// Without a context a finished session records no progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaylistContext {
    pub playlist_id: i64,
    pub student_id: i64,
}

struct SessionInner {
    state: SessionState,
    test_id: i64,
    questions: Vec<Question>,
    answers: AnswerMap,
    allotted_seconds: u64,
    remaining_seconds: u64,
    score: Option<TestScore>,
}

pub struct TestSession {
    gateway: PersistenceGateway,
    progress: ProgressService,
    context: Option<PlaylistContext>,
    inner: Arc<Mutex<SessionInner>>,
    ticker: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl TestSession {
    pub fn new(
        db: DatabaseConnection,
        progress: ProgressService,
        context: Option<PlaylistContext>,
    ) -> Self {
        Self {
            gateway: PersistenceGateway::new(db),
            progress,
            context,
            inner: Arc::new(Mutex::new(SessionInner {
                state: SessionState::NotStarted,
                test_id: 0,
                questions: Vec::new(),
                answers: AnswerMap::new(),
                allotted_seconds: 0,
                remaining_seconds: 0,
                score: None,
            })),
            ticker: std::sync::Mutex::new(None),
        }
    }

    /// Loads the test and starts the attempt.
    ///
    /// Fetches the test, its ordered questions and their ordered variants,
    /// arms the countdown with the full allotted time and transitions to
    /// `InProgress`. Data problems (empty test, questions without a correct
    /// variant) are logged and tolerated; a missing test surfaces as
    /// [`SessionError::Load`].
    pub async fn load(&self, test_id: i64) -> Result<(), SessionError> {
        {
            let guard = self.inner.lock().await;
            if guard.state != SessionState::NotStarted {
                return Err(SessionError::AlreadyStarted);
            }
        }

        let test = self.gateway.get_test(test_id).await?;
        let question_rows = self.gateway.get_questions(test_id).await?;
        let question_ids: Vec<i64> = question_rows.iter().map(|q| q.id).collect();
        let variant_rows = self.gateway.get_variants(&question_ids).await?;
        let questions = group_questions(question_rows, variant_rows);

        for issue in check::integrity_issues(&questions) {
            warn!("test {}: {}", test_id, issue);
        }

        let allotted = test.allotted_seconds();
        {
            let mut guard = self.inner.lock().await;
            if guard.state != SessionState::NotStarted {
                return Err(SessionError::AlreadyStarted);
            }
            guard.state = SessionState::InProgress;
            guard.test_id = test_id;
            guard.questions = questions;
            guard.allotted_seconds = allotted;
            guard.remaining_seconds = allotted;
        }
        self.spawn_ticker();
        Ok(())
    }

    /// Records the chosen variant position for a question position,
    /// overwriting any earlier choice. Permitted only while in progress.
    pub async fn set_answer(
        &self,
        question_position: usize,
        variant_position: usize,
    ) -> Result<(), SessionError> {
        let mut guard = self.inner.lock().await;
        match guard.state {
            SessionState::InProgress => {
                guard.answers.insert(question_position, variant_position);
                Ok(())
            }
            SessionState::NotStarted => Err(SessionError::NotStarted),
            SessionState::Finished => Err(SessionError::NotInProgress),
        }
    }

    /// Merges an answer map built outside the live flow (the resume path)
    /// into the current one. The last writer wins per position; live
    /// answers not named in `incoming` survive.
    pub async fn merge_answers(&self, incoming: &AnswerMap) -> Result<(), SessionError> {
        let mut guard = self.inner.lock().await;
        match guard.state {
            SessionState::InProgress => {
                for (&question_position, &variant_position) in incoming {
                    guard.answers.insert(question_position, variant_position);
                }
                Ok(())
            }
            SessionState::NotStarted => Err(SessionError::NotStarted),
            SessionState::Finished => Err(SessionError::NotInProgress),
        }
    }

    /// Finishes the attempt and returns the score.
    ///
    /// Idempotent: the first call scores the current answer map against the
    /// time used so far, transitions to `Finished` and records the
    /// completion when a playlist context is attached; any later call
    /// returns the same score without recomputing or re-persisting.
    /// A failed completion record is logged and does not affect the score.
    pub async fn finish(&self) -> Result<TestScore, SessionError> {
        {
            let guard = self.inner.lock().await;
            if guard.state == SessionState::NotStarted {
                return Err(SessionError::NotStarted);
            }
        }
        let score = finalize(&self.inner, &self.progress, self.context.as_ref()).await;
        self.stop_ticker();
        Ok(score)
    }

    /// Cancels the countdown without finishing. Used on navigation away
    /// from a running attempt: nothing is scored and no progress is
    /// recorded.
    pub fn shutdown(&self) {
        self.stop_ticker();
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state
    }

    pub async fn remaining_seconds(&self) -> u64 {
        self.inner.lock().await.remaining_seconds
    }

    /// Remaining time as `M:SS` for the countdown display.
    pub async fn remaining_display(&self) -> String {
        format_clock(self.remaining_seconds().await)
    }

    pub async fn answers(&self) -> AnswerMap {
        self.inner.lock().await.answers.clone()
    }

    pub async fn score(&self) -> Option<TestScore> {
        self.inner.lock().await.score
    }

    fn spawn_ticker(&self) {
        let inner = Arc::clone(&self.inner);
        let progress = self.progress.clone();
        let context = self.context;

        let handle = tokio::spawn(async move {
            let mut tick = interval(Duration::from_secs(1));
            // An interval fires immediately; consume that first tick so the
            // countdown loses its first second a full second from now.
            tick.tick().await;
            loop {
                tick.tick().await;
                let expired = {
                    let mut guard = inner.lock().await;
                    if guard.state != SessionState::InProgress {
                        break;
                    }
                    guard.remaining_seconds = guard.remaining_seconds.saturating_sub(1);
                    guard.remaining_seconds == 0
                };
                if expired {
                    finalize(&inner, &progress, context.as_ref()).await;
                    break;
                }
            }
        });

        if let Ok(mut slot) = self.ticker.lock() {
            *slot = Some(handle);
        }
    }

    fn stop_ticker(&self) {
        if let Ok(mut slot) = self.ticker.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }
}

impl Drop for TestSession {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}

/// One-time transition to `Finished`, shared by the explicit finish call
/// and the countdown's timeout path. Whichever arrives first computes the
/// score; the loser observes it already stored and returns it unchanged.
async fn finalize(
    inner: &Arc<Mutex<SessionInner>>,
    progress: &ProgressService,
    context: Option<&PlaylistContext>,
) -> TestScore {
    let (score, test_id, first_finish) = {
        let mut guard = inner.lock().await;
        match guard.score {
            Some(score) => (score, guard.test_id, false),
            None => {
                let time_taken = guard.allotted_seconds.saturating_sub(guard.remaining_seconds);
                let score = scorer::score_test(&guard.questions, &guard.answers, time_taken);
                guard.score = Some(score);
                guard.state = SessionState::Finished;
                (score, guard.test_id, true)
            }
        }
    };

    if first_finish {
        if let Some(ctx) = context {
            if let Err(err) = progress
                .record_completion(ctx.playlist_id, ctx.student_id, test_id, ItemKind::Test)
                .await
            {
                error!(
                    "failed to record completion of test {} in playlist {}: {}",
                    test_id, ctx.playlist_id, err
                );
            }
        }
    }

    score
}

/// Attaches each question's ordered variants. The gateway returns variants
/// ordered within their question already; this only distributes them.
fn group_questions(
    question_rows: Vec<db::models::question::Model>,
    variant_rows: Vec<db::models::variant::Model>,
) -> Vec<Question> {
    let mut grouped: HashMap<i64, Vec<Variant>> = HashMap::new();
    for row in variant_rows {
        grouped.entry(row.question_id).or_default().push(Variant {
            id: row.id,
            text: row.text,
            is_correct: row.is_correct,
        });
    }
    question_rows
        .into_iter()
        .map(|row| Question {
            id: row.id,
            text: row.text,
            variants: grouped.remove(&row.id).unwrap_or_default(),
        })
        .collect()
}

/// Formats seconds as `M:SS`, e.g. `4:05`.
pub fn format_clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::events::EventBus;
    use db::models::playlist::AccessMode;
    use db::test_utils::{
        link_test, seed_playlist, seed_question, seed_test, seed_variant, setup_test_db,
    };
    use tokio::sync::broadcast::error::TryRecvError;

    /// Two questions; Q1's correct variant sits at position 0, Q2's at
    /// position 1. One minute limit.
    async fn seed_two_question_test(db: &DatabaseConnection) -> i64 {
        let test = seed_test(db, "Fractions", 1, 1).await;
        let q1 = seed_question(db, test.id, "1/2 + 1/2 = ?", 0).await;
        seed_variant(db, q1.id, "1", true, 0).await;
        seed_variant(db, q1.id, "2", false, 1).await;
        let q2 = seed_question(db, test.id, "1/2 * 1/2 = ?", 1).await;
        seed_variant(db, q2.id, "1/2", false, 0).await;
        seed_variant(db, q2.id, "1/4", true, 1).await;
        test.id
    }

    struct Harness {
        db: DatabaseConnection,
        bus: EventBus,
        gateway: PersistenceGateway,
        playlist_id: i64,
        test_id: i64,
    }

    async fn playlist_harness() -> Harness {
        let db = setup_test_db().await;
        let bus = EventBus::new(8);
        let gateway = PersistenceGateway::new(db.clone());
        let test_id = seed_two_question_test(&db).await;
        let playlist = seed_playlist(&db, "Math path", AccessMode::Sequential, 1).await;
        link_test(&db, playlist.id, test_id, 0).await;
        Harness {
            db,
            bus,
            gateway,
            playlist_id: playlist.id,
            test_id,
        }
    }

    fn session_for(h: &Harness, student_id: i64) -> TestSession {
        TestSession::new(
            h.db.clone(),
            ProgressService::new(h.db.clone(), h.bus.clone()),
            Some(PlaylistContext {
                playlist_id: h.playlist_id,
                student_id,
            }),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_attempt_scores_and_records() {
        let h = playlist_harness().await;
        let session = session_for(&h, 7);
        let mut events = h.bus.subscribe();

        session.load(h.test_id).await.unwrap();
        assert_eq!(session.state().await, SessionState::InProgress);
        assert_eq!(session.remaining_seconds().await, 60);

        session.set_answer(0, 0).await.unwrap();
        session.set_answer(1, 1).await.unwrap();

        // Let ten countdown ticks elapse before finishing.
        tokio::time::sleep(Duration::from_millis(10_400)).await;

        let score = session.finish().await.unwrap();
        assert_eq!(score.total, 2);
        assert_eq!(score.correct, 2);
        assert_eq!(score.wrong, 0);
        assert_eq!(score.time_taken_seconds, 10);
        assert_eq!(session.state().await, SessionState::Finished);

        let event = events.recv().await.unwrap();
        assert_eq!(event.item_id, h.test_id);
        assert_eq!(event.kind, ItemKind::Test);

        let row = h
            .gateway
            .get_progress(h.playlist_id, 7)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.completed_ids(), vec![h.test_id]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_auto_finishes_exactly_once() {
        let h = playlist_harness().await;
        let session = session_for(&h, 7);
        let mut events = h.bus.subscribe();

        session.load(h.test_id).await.unwrap();

        // No answers; run the clock out.
        tokio::time::sleep(Duration::from_secs(61)).await;

        assert_eq!(session.state().await, SessionState::Finished);
        let score = session.score().await.unwrap();
        assert_eq!(score.total, 2);
        assert_eq!(score.correct, 0);
        assert_eq!(score.wrong, 2);
        assert_eq!(score.time_taken_seconds, 60);

        // A later explicit finish is a no-op returning the same score.
        let again = session.finish().await.unwrap();
        assert_eq!(again, score);

        events.recv().await.unwrap();
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_finish_is_idempotent() {
        let h = playlist_harness().await;
        let session = session_for(&h, 7);
        let mut events = h.bus.subscribe();

        session.load(h.test_id).await.unwrap();
        session.set_answer(0, 0).await.unwrap();
        tokio::time::sleep(Duration::from_millis(3_400)).await;

        let first = session.finish().await.unwrap();
        let second = session.finish().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.correct, 1);
        assert_eq!(first.time_taken_seconds, 3);

        // Exactly one completion event, exactly one recorded item.
        events.recv().await.unwrap();
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
        let row = h
            .gateway
            .get_progress(h.playlist_id, 7)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.completed_ids(), vec![h.test_id]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_countdown_without_recording() {
        let h = playlist_harness().await;
        let session = session_for(&h, 7);

        session.load(h.test_id).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5_400)).await;
        assert_eq!(session.remaining_seconds().await, 55);

        session.shutdown();
        tokio::time::sleep(Duration::from_secs(30)).await;

        // The countdown stopped and nothing was finished or persisted.
        assert_eq!(session.remaining_seconds().await, 55);
        assert_eq!(session.state().await, SessionState::InProgress);
        assert!(h
            .gateway
            .get_progress(h.playlist_id, 7)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_answers_rejected_outside_in_progress() {
        let h = playlist_harness().await;
        let session = session_for(&h, 7);

        assert!(matches!(
            session.set_answer(0, 0).await,
            Err(SessionError::NotStarted)
        ));

        session.load(h.test_id).await.unwrap();
        session.finish().await.unwrap();

        assert!(matches!(
            session.set_answer(0, 0).await,
            Err(SessionError::NotInProgress)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_merge_answers_keeps_live_entries_and_overwrites_named_ones() {
        let h = playlist_harness().await;
        let session = session_for(&h, 7);
        session.load(h.test_id).await.unwrap();

        session.set_answer(0, 1).await.unwrap();
        session.set_answer(1, 1).await.unwrap();

        let mut incoming = AnswerMap::new();
        incoming.insert(0, 0);
        session.merge_answers(&incoming).await.unwrap();

        let answers = session.answers().await;
        assert_eq!(answers.get(&0), Some(&0));
        assert_eq!(answers.get(&1), Some(&1));
    }

    #[tokio::test]
    async fn test_load_unknown_test_surfaces_not_found() {
        let db = setup_test_db().await;
        let bus = EventBus::new(8);
        let session = TestSession::new(db.clone(), ProgressService::new(db, bus), None);

        let err = session.load(999).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Load(GatewayError::NotFound { entity: "test", .. })
        ));
        assert_eq!(session.state().await, SessionState::NotStarted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_load_is_rejected() {
        let h = playlist_harness().await;
        let session = session_for(&h, 7);
        session.load(h.test_id).await.unwrap();

        assert!(matches!(
            session.load(h.test_id).await,
            Err(SessionError::AlreadyStarted)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_failure_does_not_hide_score() {
        let h = playlist_harness().await;
        let session = session_for(&h, 7);
        session.load(h.test_id).await.unwrap();
        session.set_answer(0, 0).await.unwrap();

        // Kill the store before finishing; scoring is local and survives.
        h.db.clone().close().await.unwrap();

        let score = session.finish().await.unwrap();
        assert_eq!(score.total, 2);
        assert_eq!(score.correct, 1);
        assert_eq!(session.state().await, SessionState::Finished);
    }

    #[tokio::test(start_paused = true)]
    async fn test_finish_without_playlist_context_records_nothing() {
        let db = setup_test_db().await;
        let bus = EventBus::new(8);
        let mut events = bus.subscribe();
        let test_id = seed_two_question_test(&db).await;
        let session = TestSession::new(db.clone(), ProgressService::new(db, bus.clone()), None);

        session.load(test_id).await.unwrap();
        let score = session.finish().await.unwrap();
        assert_eq!(score.total, 2);
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(245), "4:05");
        assert_eq!(format_clock(60), "1:00");
        assert_eq!(format_clock(5), "0:05");
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(3600), "60:00");
    }
}

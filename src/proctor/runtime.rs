// src/proctor/runtime.rs

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, RwLock};
use tokio::time::{Instant, Interval};
use uuid::Uuid;

use crate::models::{exam::Exam, student::StudentInfo};
use crate::proctor::session::{
    ExamSession, FocusState, ProctorPolicy, SessionError, SessionEvent, SessionView,
    TerminationPolicy, TickerAction,
};
use crate::store::{StoreError, SubmissionStore};

const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("{0}")]
    Session(#[from] SessionError),
    #[error("submission write failed: {0}")]
    Write(#[from] StoreError),
    /// The session task is gone (process-level shutdown).
    #[error("session is no longer running")]
    Gone,
}

enum Command {
    Event(SessionEvent, oneshot::Sender<Result<SessionView, SessionError>>),
    Snapshot(oneshot::Sender<SessionView>),
    Submit(oneshot::Sender<Result<Uuid, SubmitError>>),
}

/// Client half of one running proctoring session.
#[derive(Clone)]
pub struct SessionHandle {
    pub id: Uuid,
    tx: mpsc::Sender<Command>,
}

/// One registry slot: a live session, or the parked final snapshot of a
/// finished one.
#[derive(Clone)]
pub enum SessionEntry {
    Live(SessionHandle),
    Finished(SessionView),
}

/// Every known proctoring session, keyed by session id.
///
/// A session is `Live` while its task runs; on a terminal transition the
/// task parks its final `SessionView` here and returns, so the window can
/// keep polling the outcome while the task, channel, and answer data are
/// all released.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
}

impl SessionRegistry {
    pub async fn get(&self, id: Uuid) -> Option<SessionEntry> {
        self.inner.read().await.get(&id).cloned()
    }

    async fn insert(&self, handle: SessionHandle) {
        self.inner
            .write()
            .await
            .insert(handle.id, SessionEntry::Live(handle));
    }

    async fn finish(&self, id: Uuid, view: SessionView) {
        self.inner
            .write()
            .await
            .insert(id, SessionEntry::Finished(view));
    }
}

impl SessionHandle {
    /// Feeds a focus/blur/answer/navigate event to the session and returns
    /// the resulting snapshot.
    pub async fn event(&self, event: SessionEvent) -> Result<SessionView, SubmitError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command::Event(event, reply_tx))
            .await
            .map_err(|_| SubmitError::Gone)?;
        let view = reply_rx.await.map_err(|_| SubmitError::Gone)??;
        Ok(view)
    }

    pub async fn snapshot(&self) -> Result<SessionView, SubmitError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command::Snapshot(reply_tx))
            .await
            .map_err(|_| SubmitError::Gone)?;
        reply_rx.await.map_err(|_| SubmitError::Gone)
    }

    /// Manual submission. Returns the stored submission id on success; on a
    /// store write failure the session stays active and resubmittable.
    pub async fn submit(&self) -> Result<Uuid, SubmitError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command::Submit(reply_tx))
            .await
            .map_err(|_| SubmitError::Gone)?;
        reply_rx.await.map_err(|_| SubmitError::Gone)?
    }
}

/// Spawns the single task that owns one `ExamSession` for its whole
/// lifetime. All transitions run on this task: commands from handles and
/// ticks from the countdown are multiplexed with `select!`, so the machine
/// never sees concurrent events and needs no locks.
pub async fn spawn_session(
    exam: Exam,
    student: StudentInfo,
    policy: ProctorPolicy,
    submissions: Arc<dyn SubmissionStore>,
    registry: &SessionRegistry,
) -> SessionHandle {
    let id = Uuid::new_v4();
    let (tx, rx) = mpsc::channel(32);
    let session = ExamSession::new(exam, student, policy);
    let handle = SessionHandle { id, tx };

    registry.insert(handle.clone()).await;
    tokio::spawn(run(id, session, rx, submissions, registry.clone()));

    handle
}

async fn run(
    id: Uuid,
    mut session: ExamSession,
    mut rx: mpsc::Receiver<Command>,
    submissions: Arc<dyn SubmissionStore>,
    registry: SessionRegistry,
) {
    // The 1-second countdown exists only while the window is unfocused.
    // Every path that leaves that state drops it, so a dead session can
    // never receive a tick.
    let mut ticker: Option<Interval> = None;

    loop {
        tokio::select! {
            cmd = rx.recv() => {
                let Some(cmd) = cmd else { break };
                match cmd {
                    Command::Event(event, reply) => {
                        let result = session.apply(event).map(|action| {
                            drive_ticker(&mut ticker, action);
                            session.view()
                        });
                        let _ = reply.send(result);
                    }
                    Command::Snapshot(reply) => {
                        let _ = reply.send(session.view());
                    }
                    Command::Submit(reply) => {
                        let result = handle_submit(id, &mut session, &mut ticker, &submissions).await;
                        if session.is_terminal() {
                            // Park the final snapshot before acking, so it is
                            // already readable when the client sees the reply.
                            registry.finish(id, session.view()).await;
                            let _ = reply.send(result);
                            break;
                        }
                        let _ = reply.send(result);
                    }
                }
            }
            Some(_) = tick(&mut ticker) => {
                if let Ok(action) = session.apply(SessionEvent::Tick) {
                    drive_ticker(&mut ticker, action);
                }
                if session.is_terminated() {
                    tracing::warn!(session = %id, "grace period exhausted, session terminated");
                    auto_submit_if_configured(id, &session, &submissions).await;
                    registry.finish(id, session.view()).await;
                    break;
                }
            }
        }
    }

    tracing::debug!(session = %id, "session task finished");
}

async fn tick(ticker: &mut Option<Interval>) -> Option<Instant> {
    match ticker {
        Some(interval) => Some(interval.tick().await),
        None => None,
    }
}

fn drive_ticker(ticker: &mut Option<Interval>, action: TickerAction) {
    match action {
        TickerAction::None => {}
        // Replacing any previous interval keeps the start idempotent.
        TickerAction::Start => *ticker = Some(new_ticker()),
        TickerAction::Stop => *ticker = None,
    }
}

fn new_ticker() -> Interval {
    // interval() fires immediately; the first grace tick must land one
    // full second after focus loss.
    tokio::time::interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD)
}

async fn handle_submit(
    id: Uuid,
    session: &mut ExamSession,
    ticker: &mut Option<Interval>,
    submissions: &Arc<dyn SubmissionStore>,
) -> Result<Uuid, SubmitError> {
    session.ensure_open()?;

    // Timers stop for the duration of the write; the write's latency must
    // not eat into the grace period.
    *ticker = None;

    let payload = session.submission_payload();
    match submissions.put(payload).await {
        Ok(submission_id) => {
            session
                .complete_submit()
                .map_err(SubmitError::Session)?;
            tracing::info!(session = %id, submission = %submission_id, "submission stored");
            Ok(submission_id)
        }
        Err(err) => {
            tracing::error!(session = %id, "submission write failed: {err}");
            // Stay resubmittable: if the window is still unfocused the
            // countdown resumes where it left off.
            if session.focus() == FocusState::Unfocused {
                *ticker = Some(new_ticker());
            }
            Err(SubmitError::Write(err))
        }
    }
}

async fn auto_submit_if_configured(
    id: Uuid,
    session: &ExamSession,
    submissions: &Arc<dyn SubmissionStore>,
) {
    if session.termination_policy() != TerminationPolicy::AutoSubmit {
        return;
    }
    let payload = session.termination_payload();
    match submissions.put(payload).await {
        Ok(submission_id) => {
            tracing::info!(session = %id, submission = %submission_id, "terminated attempt stored");
        }
        Err(err) => {
            tracing::error!(session = %id, "failed to store terminated attempt: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{Question, QuestionKind};
    use crate::models::submission::AnswerValue;
    use crate::store::MemorySubmissionStore;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn exam(question_count: usize) -> Exam {
        let questions = (0..question_count)
            .map(|i| Question {
                kind: QuestionKind::Long,
                text: format!("Question {}", i + 1),
                points: 1,
                options: vec![],
                correct_option: None,
            })
            .collect();
        Exam {
            id: Uuid::new_v4(),
            title: "Final".to_string(),
            description: None,
            questions,
            created_at: chrono::Utc::now(),
        }
    }

    fn student() -> StudentInfo {
        StudentInfo {
            name: "Grace".to_string(),
            class: None,
            student_id: None,
        }
    }

    async fn spawn(
        policy: ProctorPolicy,
        store: Arc<dyn SubmissionStore>,
    ) -> (SessionRegistry, SessionHandle) {
        spawn_exam(exam(1), policy, store).await
    }

    async fn spawn_exam(
        exam: Exam,
        policy: ProctorPolicy,
        store: Arc<dyn SubmissionStore>,
    ) -> (SessionRegistry, SessionHandle) {
        let registry = SessionRegistry::default();
        let handle = spawn_session(exam, student(), policy, store, &registry).await;
        (registry, handle)
    }

    async fn sleep_secs(secs: u64) {
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }

    /// Waits for the session task to park its final snapshot.
    async fn parked_view(registry: &SessionRegistry, id: Uuid) -> SessionView {
        for _ in 0..16 {
            if let Some(SessionEntry::Finished(view)) = registry.get(id).await {
                return view;
            }
            tokio::task::yield_now().await;
        }
        panic!("session {id} never parked a final snapshot");
    }

    /// Submission store double that fails a configurable first write.
    struct FlakySubmissionStore {
        fail_next: AtomicBool,
        inner: MemorySubmissionStore,
    }

    impl FlakySubmissionStore {
        fn failing_once() -> Self {
            Self {
                fail_next: AtomicBool::new(true),
                inner: MemorySubmissionStore::default(),
            }
        }
    }

    #[async_trait::async_trait]
    impl SubmissionStore for FlakySubmissionStore {
        async fn put(&self, submission: crate::models::submission::Submission) -> Result<Uuid, StoreError> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(StoreError::WriteUnavailable("simulated outage".into()));
            }
            self.inner.put(submission).await
        }

        async fn get(&self, id: Uuid) -> Result<crate::models::submission::Submission, StoreError> {
            self.inner.get(id).await
        }

        async fn list_for_exam(
            &self,
            exam_id: Uuid,
        ) -> Result<Vec<crate::models::submission::Submission>, StoreError> {
            self.inner.list_for_exam(exam_id).await
        }

        async fn update(
            &self,
            submission: crate::models::submission::Submission,
        ) -> Result<(), StoreError> {
            self.inner.update(submission).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unfocused_for_the_whole_grace_period_terminates() {
        let (registry, handle) = spawn(
            ProctorPolicy::default(),
            Arc::new(MemorySubmissionStore::default()),
        )
        .await;
        handle.event(SessionEvent::Blur).await.unwrap();

        sleep_secs(61).await;

        let view = parked_view(&registry, handle.id).await;
        assert!(view.terminated);
        assert_eq!(view.warnings, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn refocusing_within_grace_cancels_the_countdown() {
        let (_registry, handle) = spawn(
            ProctorPolicy::default(),
            Arc::new(MemorySubmissionStore::default()),
        )
        .await;
        handle.event(SessionEvent::Blur).await.unwrap();
        sleep_secs(45).await;
        let view = handle.event(SessionEvent::Focus).await.unwrap();
        assert_eq!(view.grace_seconds_remaining, 60);

        // Long past the first deadline the session is still alive.
        sleep_secs(300).await;
        let view = handle.snapshot().await.unwrap();
        assert!(!view.terminated);
        assert_eq!(view.warnings, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn each_blur_restarts_a_full_grace_period() {
        let (registry, handle) = spawn(
            ProctorPolicy::default(),
            Arc::new(MemorySubmissionStore::default()),
        )
        .await;
        handle.event(SessionEvent::Blur).await.unwrap();
        sleep_secs(59).await;
        handle.event(SessionEvent::Focus).await.unwrap();
        handle.event(SessionEvent::Blur).await.unwrap();
        sleep_secs(59).await;

        let view = handle.snapshot().await.unwrap();
        assert!(!view.terminated);
        assert_eq!(view.warnings, 2);

        sleep_secs(2).await;
        assert!(parked_view(&registry, handle.id).await.terminated);
    }

    #[tokio::test(start_paused = true)]
    async fn discard_policy_writes_nothing_on_termination() {
        let store = Arc::new(MemorySubmissionStore::default());
        let exam = exam(1);
        let exam_id = exam.id;
        let (registry, handle) =
            spawn_exam(exam, ProctorPolicy::default(), store.clone()).await;
        handle.event(SessionEvent::Blur).await.unwrap();
        sleep_secs(61).await;

        assert!(parked_view(&registry, handle.id).await.terminated);
        assert!(store.list_for_exam(exam_id).await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn auto_submit_policy_stores_an_incomplete_attempt() {
        let store = Arc::new(MemorySubmissionStore::default());
        let exam = exam(1);
        let exam_id = exam.id;
        let policy = ProctorPolicy {
            termination: TerminationPolicy::AutoSubmit,
            ..ProctorPolicy::default()
        };
        let (_registry, handle) = spawn_exam(exam, policy, store.clone()).await;
        handle
            .event(SessionEvent::Answer(AnswerValue::Text("half done".into())))
            .await
            .unwrap();
        handle.event(SessionEvent::Blur).await.unwrap();
        sleep_secs(61).await;

        let stored = store.list_for_exam(exam_id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert!(!stored[0].completed);
        assert_eq!(stored[0].warnings, 1);
        assert_eq!(
            stored[0].answers[0],
            Some(AnswerValue::Text("half done".into()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failed_write_keeps_session_resubmittable() {
        let store = Arc::new(FlakySubmissionStore::failing_once());
        let exam = exam(1);
        let exam_id = exam.id;
        let (registry, handle) =
            spawn_exam(exam, ProctorPolicy::default(), store.clone()).await;
        handle
            .event(SessionEvent::Answer(AnswerValue::Text("my essay".into())))
            .await
            .unwrap();

        let first = handle.submit().await;
        assert!(matches!(first, Err(SubmitError::Write(_))));
        assert!(!handle.snapshot().await.unwrap().submitted);

        let submission_id = handle.submit().await.unwrap();
        assert!(parked_view(&registry, handle.id).await.submitted);

        let stored = store.get(submission_id).await.unwrap();
        assert_eq!(stored.exam_id, exam_id);
        assert!(stored.completed);
        assert_eq!(stored.answers[0], Some(AnswerValue::Text("my essay".into())));
    }

    #[tokio::test(start_paused = true)]
    async fn termination_ends_the_session_task_but_keeps_the_outcome() {
        let (registry, handle) = spawn(
            ProctorPolicy::default(),
            Arc::new(MemorySubmissionStore::default()),
        )
        .await;
        handle.event(SessionEvent::Blur).await.unwrap();
        sleep_secs(61).await;

        let view = parked_view(&registry, handle.id).await;
        assert!(view.terminated);
        assert!(!view.exit_requires_confirmation);

        // The task and its channel are gone; stale handles can no longer
        // reach the session.
        assert!(matches!(
            handle.submit().await,
            Err(SubmitError::Gone)
        ));
        assert!(matches!(
            handle.event(SessionEvent::Focus).await,
            Err(SubmitError::Gone)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn successful_submit_ends_the_session_task_but_keeps_the_outcome() {
        let (registry, handle) = spawn(
            ProctorPolicy::default(),
            Arc::new(MemorySubmissionStore::default()),
        )
        .await;
        handle.submit().await.unwrap();

        let view = parked_view(&registry, handle.id).await;
        assert!(view.submitted);

        assert!(matches!(handle.submit().await, Err(SubmitError::Gone)));
    }
}

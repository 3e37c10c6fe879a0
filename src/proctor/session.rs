// src/proctor/session.rs

use serde::Serialize;
use uuid::Uuid;

use crate::models::{
    exam::Exam,
    student::StudentInfo,
    submission::{AnswerValue, Submission},
};

/// Grace period after focus loss before forced termination, in seconds.
pub const DEFAULT_GRACE_SECS: u32 = 60;

/// Whether a force-terminated attempt is written to the submission store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationPolicy {
    /// Nothing is written; the attempt stays absent server-side.
    Discard,
    /// The last-known answers and warning count are written with
    /// `completed: false`.
    AutoSubmit,
}

/// Configuration knobs of the focus-integrity machine.
#[derive(Debug, Clone, Copy)]
pub struct ProctorPolicy {
    pub grace_secs: u32,
    /// When true, answer edits are rejected while the window is unfocused.
    pub lock_answers_when_blurred: bool,
    pub termination: TerminationPolicy,
}

impl Default for ProctorPolicy {
    fn default() -> Self {
        Self {
            grace_secs: DEFAULT_GRACE_SECS,
            lock_answers_when_blurred: false,
            termination: TerminationPolicy::Discard,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusState {
    Focused,
    Unfocused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Active,
    Terminated,
    Submitted,
}

/// External input to the machine. `Tick` is fed by the runtime's 1-second
/// countdown while the window is unfocused.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Blur,
    Focus,
    Tick,
    Answer(AnswerValue),
    Navigate(usize),
}

/// What the caller must do with its countdown ticker after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum TickerAction {
    None,
    Start,
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("session is already terminated")]
    Terminated,
    #[error("session is already submitted")]
    Submitted,
    #[error("answers are locked while the window is unfocused")]
    AnswersLocked,
    #[error("question index {0} is out of range")]
    QuestionOutOfRange(usize),
}

/// Read-only snapshot of a session for the exam window UI.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub exam_id: Uuid,
    pub exam_title: String,
    pub student_name: String,
    pub question_count: usize,
    pub current_question: usize,
    pub answered_count: usize,
    pub focus: FocusState,
    pub warnings: u32,
    pub grace_seconds_remaining: u32,
    pub terminated: bool,
    pub submitted: bool,
    /// The window must confirm close/navigate-away while the attempt is
    /// live; once terminal, exit is unconditional.
    pub exit_requires_confirmation: bool,
}

/// One exam attempt's focus-integrity state machine.
///
/// States are `Active`+`Focused` (initial), `Active`+`Unfocused`, and the
/// terminal `Terminated` / `Submitted`. The machine is purely event-driven;
/// the owning runtime translates `TickerAction` into starting and stopping
/// the real 1-second countdown, so every transition here is deterministic
/// and directly testable.
pub struct ExamSession {
    exam: Exam,
    student: StudentInfo,
    answers: Vec<Option<AnswerValue>>,
    current_question: usize,
    focus: FocusState,
    warnings: u32,
    grace_remaining: u32,
    phase: Phase,
    policy: ProctorPolicy,
}

impl ExamSession {
    pub fn new(exam: Exam, student: StudentInfo, policy: ProctorPolicy) -> Self {
        let answers = vec![None; exam.questions.len()];
        Self {
            exam,
            student,
            answers,
            current_question: 0,
            focus: FocusState::Focused,
            warnings: 0,
            grace_remaining: policy.grace_secs,
            phase: Phase::Active,
            policy,
        }
    }

    /// Applies one event. Stale focus/blur/tick signals against a terminal
    /// or already-matching state are no-ops, never errors: the browser can
    /// emit them at any time and they must not resurrect or double-arm
    /// anything. Answer and navigation input against a closed session is an
    /// error so the caller can report it.
    pub fn apply(&mut self, event: SessionEvent) -> Result<TickerAction, SessionError> {
        match event {
            SessionEvent::Blur => Ok(self.on_blur()),
            SessionEvent::Focus => Ok(self.on_focus()),
            SessionEvent::Tick => Ok(self.on_tick()),
            SessionEvent::Answer(value) => self.on_answer(value).map(|()| TickerAction::None),
            SessionEvent::Navigate(index) => self.on_navigate(index).map(|()| TickerAction::None),
        }
    }

    fn on_blur(&mut self) -> TickerAction {
        if self.phase != Phase::Active || self.focus == FocusState::Unfocused {
            // Duplicate blur: the countdown is already running.
            return TickerAction::None;
        }
        self.focus = FocusState::Unfocused;
        self.warnings += 1;
        self.grace_remaining = self.policy.grace_secs;
        TickerAction::Start
    }

    fn on_focus(&mut self) -> TickerAction {
        if self.phase != Phase::Active || self.focus == FocusState::Focused {
            return TickerAction::None;
        }
        self.focus = FocusState::Focused;
        self.grace_remaining = self.policy.grace_secs;
        TickerAction::Stop
    }

    fn on_tick(&mut self) -> TickerAction {
        if self.phase != Phase::Active || self.focus == FocusState::Focused {
            // Stale tick from a countdown that should already be stopped.
            return TickerAction::None;
        }
        self.grace_remaining = self.grace_remaining.saturating_sub(1);
        if self.grace_remaining == 0 {
            self.phase = Phase::Terminated;
            return TickerAction::Stop;
        }
        TickerAction::None
    }

    fn on_answer(&mut self, value: AnswerValue) -> Result<(), SessionError> {
        self.ensure_open()?;
        if self.policy.lock_answers_when_blurred && self.focus == FocusState::Unfocused {
            return Err(SessionError::AnswersLocked);
        }
        self.answers[self.current_question] = Some(value);
        Ok(())
    }

    fn on_navigate(&mut self, index: usize) -> Result<(), SessionError> {
        self.ensure_open()?;
        if index >= self.exam.questions.len() {
            return Err(SessionError::QuestionOutOfRange(index));
        }
        self.current_question = index;
        Ok(())
    }

    /// Errs with the terminal state's error if the session is closed.
    pub fn ensure_open(&self) -> Result<(), SessionError> {
        match self.phase {
            Phase::Active => Ok(()),
            Phase::Terminated => Err(SessionError::Terminated),
            Phase::Submitted => Err(SessionError::Submitted),
        }
    }

    /// Marks the session submitted. Called only after the submission store
    /// write has succeeded; a failed write leaves the machine `Active` so
    /// the student can re-press submit without losing answers.
    pub fn complete_submit(&mut self) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.phase = Phase::Submitted;
        Ok(())
    }

    /// Assembles the submission payload for a manual submit.
    pub fn submission_payload(&self) -> Submission {
        self.payload(true)
    }

    /// Assembles the payload written by the `AutoSubmit` termination policy.
    pub fn termination_payload(&self) -> Submission {
        self.payload(false)
    }

    fn payload(&self, completed: bool) -> Submission {
        Submission {
            id: Uuid::new_v4(),
            exam_id: self.exam.id,
            exam_title: self.exam.title.clone(),
            student_name: self.student.name.clone(),
            student_class: self.student.class.clone(),
            student_id: self.student.student_id.clone(),
            answers: self.answers.clone(),
            warnings: self.warnings,
            completed,
            submitted_at: chrono::Utc::now(),
            graded: false,
            grades: None,
            comments: None,
            total_score: None,
            max_score: None,
            graded_at: None,
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            exam_id: self.exam.id,
            exam_title: self.exam.title.clone(),
            student_name: self.student.name.clone(),
            question_count: self.exam.questions.len(),
            current_question: self.current_question,
            answered_count: self.answers.iter().filter(|a| a.is_some()).count(),
            focus: self.focus,
            warnings: self.warnings,
            grace_seconds_remaining: self.grace_remaining,
            terminated: self.phase == Phase::Terminated,
            submitted: self.phase == Phase::Submitted,
            exit_requires_confirmation: self.phase == Phase::Active,
        }
    }

    pub fn focus(&self) -> FocusState {
        self.focus
    }

    pub fn is_terminal(&self) -> bool {
        self.phase != Phase::Active
    }

    pub fn is_terminated(&self) -> bool {
        self.phase == Phase::Terminated
    }

    pub fn termination_policy(&self) -> TerminationPolicy {
        self.policy.termination
    }
}

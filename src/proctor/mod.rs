// src/proctor/mod.rs

pub mod runtime;
pub mod session;

pub use runtime::{SessionEntry, SessionHandle, SessionRegistry, SubmitError, spawn_session};
pub use session::{
    ExamSession, FocusState, ProctorPolicy, SessionError, SessionEvent, SessionView,
    TerminationPolicy,
};

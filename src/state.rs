// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::config::Config;
use crate::handoff::HandoffChannel;
use crate::store::{ExamStore, MemoryExamStore, MemorySubmissionStore, SubmissionStore};

pub use crate::proctor::{SessionEntry, SessionRegistry};

#[derive(Clone)]
pub struct AppState {
    pub exams: Arc<dyn ExamStore>,
    pub submissions: Arc<dyn SubmissionStore>,
    pub sessions: SessionRegistry,
    pub handoff: Arc<HandoffChannel>,
    pub config: Config,
}

impl AppState {
    /// State backed by in-memory document collections.
    pub fn in_memory(config: Config) -> Self {
        Self {
            exams: Arc::new(MemoryExamStore::default()),
            submissions: Arc::new(MemorySubmissionStore::default()),
            sessions: SessionRegistry::default(),
            handoff: Arc::new(HandoffChannel::default()),
            config,
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

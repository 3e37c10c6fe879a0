// src/store/mod.rs

pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{exam::Exam, submission::Submission};

pub use memory::{MemoryExamStore, MemorySubmissionStore};

/// Errors from the document store boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document not found")]
    NotFound,

    /// The write could not be completed; the caller may retry.
    #[error("write unavailable: {0}")]
    WriteUnavailable(String),
}

/// Read side of the exams collection.
#[async_trait]
pub trait ExamStore: Send + Sync {
    async fn put(&self, exam: Exam) -> Result<Uuid, StoreError>;
    async fn get(&self, id: Uuid) -> Result<Exam, StoreError>;
    async fn list(&self) -> Result<Vec<Exam>, StoreError>;
}

/// Append-and-update surface of the submissions collection.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn put(&self, submission: Submission) -> Result<Uuid, StoreError>;
    async fn get(&self, id: Uuid) -> Result<Submission, StoreError>;
    async fn list_for_exam(&self, exam_id: Uuid) -> Result<Vec<Submission>, StoreError>;
    async fn update(&self, submission: Submission) -> Result<(), StoreError>;
}

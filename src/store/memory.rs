// src/store/memory.rs

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{exam::Exam, submission::Submission};
use crate::store::{ExamStore, StoreError, SubmissionStore};

/// In-memory exams collection. Stands in for the hosted document database,
/// which is an external collaborator outside this service.
#[derive(Default)]
pub struct MemoryExamStore {
    docs: RwLock<HashMap<Uuid, Exam>>,
}

#[async_trait]
impl ExamStore for MemoryExamStore {
    async fn put(&self, exam: Exam) -> Result<Uuid, StoreError> {
        let id = exam.id;
        self.docs.write().await.insert(id, exam);
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Exam, StoreError> {
        self.docs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self) -> Result<Vec<Exam>, StoreError> {
        let mut exams: Vec<Exam> = self.docs.read().await.values().cloned().collect();
        exams.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(exams)
    }
}

/// In-memory submissions collection.
#[derive(Default)]
pub struct MemorySubmissionStore {
    docs: RwLock<HashMap<Uuid, Submission>>,
}

#[async_trait]
impl SubmissionStore for MemorySubmissionStore {
    async fn put(&self, submission: Submission) -> Result<Uuid, StoreError> {
        let id = submission.id;
        self.docs.write().await.insert(id, submission);
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Submission, StoreError> {
        self.docs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_for_exam(&self, exam_id: Uuid) -> Result<Vec<Submission>, StoreError> {
        let mut subs: Vec<Submission> = self
            .docs
            .read()
            .await
            .values()
            .filter(|s| s.exam_id == exam_id)
            .cloned()
            .collect();
        subs.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(subs)
    }

    async fn update(&self, submission: Submission) -> Result<(), StoreError> {
        let mut docs = self.docs.write().await;
        if !docs.contains_key(&submission.id) {
            return Err(StoreError::NotFound);
        }
        docs.insert(submission.id, submission);
        Ok(())
    }
}

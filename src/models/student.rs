// src/models/student.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Identity of an exam taker, collected on the registration screen.
/// Only the name is required; class and student id are free-form extras.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentInfo {
    pub name: String,
    pub class: Option<String>,
    pub student_id: Option<String>,
}

/// DTO for the registration form.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 100))]
    pub class: Option<String>,
    #[validate(length(max = 100))]
    pub student_id: Option<String>,
}

impl RegisterRequest {
    /// Normalizes the form into a `StudentInfo`, trimming whitespace and
    /// dropping empty optional fields.
    pub fn into_student(self) -> StudentInfo {
        let clean = |s: Option<String>| s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        StudentInfo {
            name: self.name.trim().to_string(),
            class: clean(self.class),
            student_id: clean(self.student_id),
        }
    }
}

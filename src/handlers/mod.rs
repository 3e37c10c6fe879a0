// src/handlers/mod.rs

pub mod exams;
pub mod session;
pub mod submissions;
pub mod take_exam;

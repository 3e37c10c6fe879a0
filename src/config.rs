// src/config.rs

use std::env;

use dotenvy::dotenv;

use crate::proctor::{ProctorPolicy, TerminationPolicy, session::DEFAULT_GRACE_SECS};

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub rust_log: String,

    /// Seconds a taker may stay unfocused before forced termination.
    pub grace_period_secs: u32,

    /// Whether a force-terminated attempt is written to the store.
    pub auto_submit_on_termination: bool,

    /// Whether answer edits are rejected while the window is unfocused.
    pub lock_answers_when_blurred: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let grace_period_secs = env::var("GRACE_PERIOD_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|&v| v > 0)
            .unwrap_or(DEFAULT_GRACE_SECS);

        let auto_submit_on_termination = env::var("TERMINATION_POLICY")
            .map(|v| v.eq_ignore_ascii_case("auto-submit"))
            .unwrap_or(false);

        let lock_answers_when_blurred = env::var("LOCK_ANSWERS_WHEN_BLURRED")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            bind_addr,
            rust_log,
            grace_period_secs,
            auto_submit_on_termination,
            lock_answers_when_blurred,
        }
    }

    /// Policy handed to every new proctoring session.
    pub fn proctor_policy(&self) -> ProctorPolicy {
        ProctorPolicy {
            grace_secs: self.grace_period_secs,
            lock_answers_when_blurred: self.lock_answers_when_blurred,
            termination: if self.auto_submit_on_termination {
                TerminationPolicy::AutoSubmit
            } else {
                TerminationPolicy::Discard
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:0".to_string(),
            rust_log: "info".to_string(),
            grace_period_secs: DEFAULT_GRACE_SECS,
            auto_submit_on_termination: false,
            lock_answers_when_blurred: false,
        }
    }
}

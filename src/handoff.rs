// src/handoff.rs

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::models::{exam::Exam, student::StudentInfo};

/// How long an offered payload waits for its window to open. A student who
/// registers and never opens the window abandons the slot; after this long
/// the exam snapshot inside it is dropped.
const SLOT_TTL: Duration = Duration::from_secs(5 * 60);

/// Payload handed from the registration screen to the exam window.
#[derive(Debug, Clone)]
pub struct TransferPayload {
    pub exam: Exam,
    pub student: StudentInfo,
}

struct Slot {
    payload: TransferPayload,
    offered_at: Instant,
}

/// One-shot transfer channel between the registration step and the exam
/// window: each offered payload is claimable exactly once, and claiming
/// consumes the slot. A second claim of the same token fails, and so does a
/// claim arriving after the slot's time-to-live.
pub struct HandoffChannel {
    ttl: Duration,
    slots: Mutex<HashMap<Uuid, Slot>>,
}

impl Default for HandoffChannel {
    fn default() -> Self {
        Self::with_ttl(SLOT_TTL)
    }
}

impl HandoffChannel {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Stores a payload and returns the single-use token for it. Abandoned
    /// slots are swept here, so the map never outgrows the registration
    /// rate times the time-to-live.
    pub fn offer(&self, payload: TransferPayload) -> Uuid {
        let token = Uuid::new_v4();
        let mut slots = self.slots.lock().expect("handoff lock poisoned");
        slots.retain(|_, slot| slot.offered_at.elapsed() < self.ttl);
        slots.insert(
            token,
            Slot {
                payload,
                offered_at: Instant::now(),
            },
        );
        token
    }

    /// Consumes and returns the payload for `token`, if it is still live
    /// and has not expired.
    pub fn claim(&self, token: Uuid) -> Option<TransferPayload> {
        let slot = self
            .slots
            .lock()
            .expect("handoff lock poisoned")
            .remove(&token)?;
        (slot.offered_at.elapsed() < self.ttl).then_some(slot.payload)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots.lock().expect("handoff lock poisoned").len()
    }
}

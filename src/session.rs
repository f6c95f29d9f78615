use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, SystemTime};
use uuid::Uuid;

/// Name of the cookie carrying the visitor's session id
pub const SESSION_COOKIE: &str = "verify_session";

/// Attempt bookkeeping for one visitor session
#[derive(Debug, Clone)]
struct AttemptWindow {
    /// Lookups made since the window started
    attempts: u32,

    /// When the current counting window opened
    window_started: SystemTime,

    /// Length of this session's counting window
    window: Duration,
}

lazy_static! {
    /// Global attempt counters, keyed by session id
    static ref ATTEMPTS: RwLock<HashMap<String, AttemptWindow>> = RwLock::new(HashMap::new());
}

/// Outcome of charging one lookup against a session's attempt budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The lookup may proceed
    Allowed {
        /// Attempts left in the current window after this one
        remaining: u32,
    },

    /// The budget for the current window is spent
    Exhausted {
        /// Seconds until the window resets
        retry_after_secs: u64,
    },
}

/// Create a fresh session id for a visitor without one
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Charge one lookup attempt against a session's budget
///
/// Every lookup counts, found or not; "not found" answers are exactly what an
/// enumeration attempt produces. Windows that have fully elapsed are reset in
/// place, and stale entries for other sessions are pruned while the write
/// lock is held anyway.
///
/// # Arguments
/// * `session_id` - The visitor's session id
/// * `budget` - Maximum attempts per window
/// * `window` - Length of the counting window
///
/// # Returns
/// * [`AttemptOutcome`] - Whether this lookup may proceed
pub fn register_attempt(session_id: &str, budget: u32, window: Duration) -> AttemptOutcome {
    let now = SystemTime::now();
    let mut attempts = ATTEMPTS.write().unwrap();

    attempts.retain(|_, entry| {
        now.duration_since(entry.window_started)
            .map(|age| age < entry.window)
            .unwrap_or(true)
    });

    let entry = attempts.entry(session_id.to_string()).or_insert(AttemptWindow {
        attempts: 0,
        window_started: now,
        window,
    });

    if entry.attempts >= budget {
        let age = now
            .duration_since(entry.window_started)
            .unwrap_or(Duration::ZERO);
        let retry_after = window.saturating_sub(age);
        return AttemptOutcome::Exhausted {
            retry_after_secs: retry_after.as_secs().max(1),
        };
    }

    entry.attempts += 1;
    AttemptOutcome::Allowed {
        remaining: budget - entry.attempts,
    }
}

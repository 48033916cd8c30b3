use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::{AppPhase, BreathPhase, LootItem, SessionPhase, SessionSettings};

/// Every state change in the engine produces an Event.
/// Front-ends poll for events or print them as JSON lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    FocusStarted {
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        seconds_left: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    /// Focus countdown expired; the break (and breathing game) began.
    BreakStarted {
        sessions_today: u64,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    /// The breathing game crossed a phase boundary.
    BreathAdvanced {
        phase: BreathPhase,
        cycles: u64,
        at: DateTime<Utc>,
    },
    /// Break countdown expired; the session is over. `loot` is `Some`
    /// when enough breath cycles completed to earn a reward.
    SessionCompleted {
        cycles: u64,
        loot: Option<LootItem>,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: SessionPhase,
        app_phase: AppPhase,
        seconds_left: u64,
        is_running: bool,
        timer_display: String,
        timer_progress: f64,
        breath_phase: BreathPhase,
        breath_label: String,
        breath_progress: f64,
        breath_cycles: u64,
        sessions_today: u64,
        inventory: Vec<LootItem>,
        new_loot: Option<LootItem>,
        settings: SessionSettings,
        at: DateTime<Utc>,
    },
}

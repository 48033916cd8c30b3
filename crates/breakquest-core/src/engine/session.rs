//! Session engine implementation.
//!
//! The session engine is a tick-driven state machine. It does not own
//! real time -- the caller is responsible for calling `tick()` once per
//! second while the countdown runs, and `breath_tick()` at a finer
//! granularity during breaks.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Work -> Break -> Idle
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = SessionEngine::new(SessionSettings::default());
//! engine.start_focus();
//! // In a loop:
//! engine.tick();            // Returns Some(Event) on phase transitions
//! engine.breath_tick(0.05); // Returns Some(Event) on breath boundaries
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::breath::BreathCycle;
use super::loot::{LootAllocator, LootItem};
use crate::events::Event;

/// Top-level mode driving which UI is shown. Derived from
/// [`SessionPhase`], never set independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppPhase {
    Focus,
    BreakGame,
    Idle,
}

/// Finer-grained phase used for countdown-duration lookup and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Work,
    Break,
    Idle,
}

impl SessionPhase {
    pub fn app_phase(self) -> AppPhase {
        match self {
            SessionPhase::Work => AppPhase::Focus,
            SessionPhase::Break => AppPhase::BreakGame,
            SessionPhase::Idle => AppPhase::Idle,
        }
    }
}

/// User-configurable session durations.
///
/// Changes made while a session is active apply only to the next
/// `start_focus()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u32,
}

fn default_work_minutes() -> u32 {
    25
}
fn default_break_minutes() -> u32 {
    5
}

impl SessionSettings {
    pub fn work_secs(&self) -> u64 {
        u64::from(self.work_minutes).saturating_mul(60)
    }

    pub fn break_secs(&self) -> u64 {
        u64::from(self.break_minutes).saturating_mul(60)
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            break_minutes: default_break_minutes(),
        }
    }
}

/// Core session engine.
///
/// Owns the countdown, the breathing sub-timer, the inventory and the
/// completed-session counter. Operations never fail; invalid calls
/// (e.g. starting while already running) are defined no-ops that return
/// `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEngine {
    settings: SessionSettings,
    phase: SessionPhase,
    seconds_left: u64,
    is_running: bool,
    /// Phase totals captured at `start_focus()`. Settings edits made
    /// mid-session do not touch these until the engine is idle again.
    work_total_secs: u64,
    break_total_secs: u64,
    sessions_today: u64,
    inventory: Vec<LootItem>,
    new_loot: Option<LootItem>,
    breath: BreathCycle,
    #[serde(skip, default)]
    allocator: LootAllocator,
}

impl SessionEngine {
    /// Create an idle engine with the countdown primed to a full work
    /// session.
    pub fn new(settings: SessionSettings) -> Self {
        Self::with_state(settings, 0, Vec::new())
    }

    /// Create an engine restored from persisted counters and inventory.
    pub fn with_state(
        settings: SessionSettings,
        sessions_today: u64,
        inventory: Vec<LootItem>,
    ) -> Self {
        Self {
            settings,
            phase: SessionPhase::Idle,
            seconds_left: settings.work_secs(),
            is_running: false,
            work_total_secs: settings.work_secs(),
            break_total_secs: settings.break_secs(),
            sessions_today,
            inventory,
            new_loot: None,
            breath: BreathCycle::new(),
            allocator: LootAllocator::new(),
        }
    }

    /// Replace the reward allocator (seeded in tests).
    pub fn set_allocator(&mut self, allocator: LootAllocator) {
        self.allocator = allocator;
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn app_phase(&self) -> AppPhase {
        self.phase.app_phase()
    }

    pub fn seconds_left(&self) -> u64 {
        self.seconds_left
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn sessions_today(&self) -> u64 {
        self.sessions_today
    }

    pub fn inventory(&self) -> &[LootItem] {
        &self.inventory
    }

    pub fn new_loot(&self) -> Option<&LootItem> {
        self.new_loot.as_ref()
    }

    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    pub fn breath(&self) -> &BreathCycle {
        &self.breath
    }

    /// Countdown formatted as zero-padded `MM:SS`. Minutes are not
    /// capped, so configured durations under 100 minutes always render
    /// as two digits.
    pub fn timer_display(&self) -> String {
        let m = self.seconds_left / 60;
        let s = self.seconds_left % 60;
        format!("{m:02}:{s:02}")
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn timer_progress(&self) -> f64 {
        let total = match self.phase {
            SessionPhase::Break => self.break_total_secs,
            _ => self.work_total_secs,
        };
        if total == 0 {
            return 0.0;
        }
        (total - self.seconds_left) as f64 / total as f64
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            phase: self.phase,
            app_phase: self.app_phase(),
            seconds_left: self.seconds_left,
            is_running: self.is_running,
            timer_display: self.timer_display(),
            timer_progress: self.timer_progress(),
            breath_phase: self.breath.phase(),
            breath_label: self.breath.phase().label().to_string(),
            breath_progress: self.breath.progress(),
            breath_cycles: self.breath.cycles(),
            sessions_today: self.sessions_today,
            inventory: self.inventory.clone(),
            new_loot: self.new_loot.clone(),
            settings: self.settings,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a focus session. No-op while a countdown is running.
    pub fn start_focus(&mut self) -> Option<Event> {
        if self.is_running {
            return None;
        }
        // The breath timer only ever runs during a break; entering a
        // work phase from a paused break must not leave it ticking.
        self.breath.stop();
        self.work_total_secs = self.settings.work_secs();
        self.break_total_secs = self.settings.break_secs();
        self.phase = SessionPhase::Work;
        self.seconds_left = self.work_total_secs;
        self.is_running = true;
        Some(Event::FocusStarted {
            duration_secs: self.work_total_secs,
            at: Utc::now(),
        })
    }

    /// Stop the countdown without resetting it. Legal in any state.
    pub fn pause_focus(&mut self) -> Option<Event> {
        self.is_running = false;
        Some(Event::TimerPaused {
            seconds_left: self.seconds_left,
            at: Utc::now(),
        })
    }

    /// Stop both tickers and return to idle with a full work countdown.
    pub fn reset_all(&mut self) -> Option<Event> {
        self.is_running = false;
        self.breath.stop();
        self.phase = SessionPhase::Idle;
        self.work_total_secs = self.settings.work_secs();
        self.break_total_secs = self.settings.break_secs();
        self.seconds_left = self.work_total_secs;
        Some(Event::TimerReset { at: Utc::now() })
    }

    /// Clear the transient new-loot notification.
    pub fn dismiss_loot(&mut self) {
        self.new_loot = None;
    }

    /// Record new durations. They take effect immediately when idle,
    /// otherwise at the next `start_focus()`.
    pub fn set_settings(&mut self, settings: SessionSettings) {
        self.settings = settings;
        if self.phase == SessionPhase::Idle && !self.is_running {
            self.work_total_secs = settings.work_secs();
            self.break_total_secs = settings.break_secs();
            self.seconds_left = self.work_total_secs;
        }
    }

    /// Call once per second while running. Returns `Some(Event)` when a
    /// phase transition fires.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.is_running {
            return None;
        }
        if self.seconds_left > 0 {
            self.seconds_left -= 1;
            return None;
        }
        self.advance_phase()
    }

    /// Call at a fine granularity (e.g. every 50 ms) while the
    /// breathing game runs. Returns `Some(Event)` on phase boundaries.
    pub fn breath_tick(&mut self, dt: f64) -> Option<Event> {
        let advance = self.breath.tick(dt)?;
        Some(Event::BreathAdvanced {
            phase: advance.phase,
            cycles: self.breath.cycles(),
            at: Utc::now(),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn advance_phase(&mut self) -> Option<Event> {
        match self.phase {
            SessionPhase::Work => {
                self.sessions_today += 1;
                self.phase = SessionPhase::Break;
                self.seconds_left = self.break_total_secs;
                self.breath.start();
                Some(Event::BreakStarted {
                    sessions_today: self.sessions_today,
                    duration_secs: self.break_total_secs,
                    at: Utc::now(),
                })
            }
            SessionPhase::Break => {
                self.breath.stop();
                let cycles = self.breath.cycles();
                let loot = self.allocator.evaluate(cycles);
                if let Some(ref item) = loot {
                    self.inventory.push(item.clone());
                    self.new_loot = Some(item.clone());
                }
                self.phase = SessionPhase::Idle;
                self.is_running = false;
                self.work_total_secs = self.settings.work_secs();
                self.break_total_secs = self.settings.break_secs();
                self.seconds_left = self.work_total_secs;
                Some(Event::SessionCompleted {
                    cycles,
                    loot,
                    at: Utc::now(),
                })
            }
            // Idle never self-advances.
            SessionPhase::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::loot::LootAllocator;
    use proptest::prelude::*;

    fn short_engine() -> SessionEngine {
        let mut engine = SessionEngine::new(SessionSettings {
            work_minutes: 1,
            break_minutes: 1,
        });
        engine.set_allocator(LootAllocator::with_seed(99));
        engine
    }

    /// Run the countdown to zero and fire the transition tick.
    fn exhaust_phase(engine: &mut SessionEngine) -> Event {
        while engine.seconds_left() > 0 {
            assert!(engine.tick().is_none());
        }
        engine.tick().expect("transition event")
    }

    #[test]
    fn fresh_start_enters_work() {
        let mut engine = SessionEngine::new(SessionSettings::default());
        assert!(engine.start_focus().is_some());
        assert_eq!(engine.phase(), SessionPhase::Work);
        assert_eq!(engine.app_phase(), AppPhase::Focus);
        assert!(engine.is_running());
        assert_eq!(engine.seconds_left(), 25 * 60);
    }

    #[test]
    fn double_start_is_a_noop() {
        let mut engine = SessionEngine::new(SessionSettings::default());
        engine.start_focus();
        engine.tick();
        let before = engine.seconds_left();
        assert!(engine.start_focus().is_none());
        assert_eq!(engine.seconds_left(), before);
    }

    #[test]
    fn tick_decrements_only_while_running() {
        let mut engine = SessionEngine::new(SessionSettings::default());
        assert!(engine.tick().is_none());
        assert_eq!(engine.seconds_left(), 25 * 60);

        engine.start_focus();
        engine.tick();
        assert_eq!(engine.seconds_left(), 25 * 60 - 1);

        engine.pause_focus();
        engine.tick();
        assert_eq!(engine.seconds_left(), 25 * 60 - 1);
    }

    #[test]
    fn work_expiry_transitions_to_break() {
        let mut engine = short_engine();
        engine.start_focus();
        let event = exhaust_phase(&mut engine);
        match event {
            Event::BreakStarted {
                sessions_today,
                duration_secs,
                ..
            } => {
                assert_eq!(sessions_today, 1);
                assert_eq!(duration_secs, 60);
            }
            other => panic!("Expected BreakStarted, got {other:?}"),
        }
        assert_eq!(engine.phase(), SessionPhase::Break);
        assert_eq!(engine.app_phase(), AppPhase::BreakGame);
        assert!(engine.is_running());
        assert_eq!(engine.seconds_left(), 60);
        assert!(engine.breath().is_active());
        assert_eq!(engine.breath().cycles(), 0);
    }

    #[test]
    fn break_expiry_without_cycles_awards_nothing() {
        let mut engine = short_engine();
        engine.start_focus();
        exhaust_phase(&mut engine);
        // One lap only -- below the award threshold.
        engine.breath_tick(4.0);
        engine.breath_tick(2.0);
        engine.breath_tick(4.0);
        let event = exhaust_phase(&mut engine);
        match event {
            Event::SessionCompleted { cycles, loot, .. } => {
                assert_eq!(cycles, 1);
                assert!(loot.is_none());
            }
            other => panic!("Expected SessionCompleted, got {other:?}"),
        }
        assert_eq!(engine.phase(), SessionPhase::Idle);
        assert!(!engine.is_running());
        assert!(engine.inventory().is_empty());
        assert!(engine.new_loot().is_none());
        assert_eq!(engine.seconds_left(), 60);
    }

    #[test]
    fn break_expiry_with_two_cycles_awards_loot() {
        let mut engine = short_engine();
        engine.start_focus();
        exhaust_phase(&mut engine);
        for _ in 0..2 {
            engine.breath_tick(4.0);
            engine.breath_tick(2.0);
            engine.breath_tick(4.0);
        }
        assert_eq!(engine.breath().cycles(), 2);
        let event = exhaust_phase(&mut engine);
        match event {
            Event::SessionCompleted { cycles, loot, .. } => {
                assert_eq!(cycles, 2);
                assert!(loot.is_some());
            }
            other => panic!("Expected SessionCompleted, got {other:?}"),
        }
        assert_eq!(engine.inventory().len(), 1);
        assert!(engine.new_loot().is_some());
        assert!(!engine.breath().is_active());

        engine.dismiss_loot();
        assert!(engine.new_loot().is_none());
        assert_eq!(engine.inventory().len(), 1);
    }

    #[test]
    fn reset_returns_to_idle_and_stops_breathing() {
        let mut engine = short_engine();
        engine.start_focus();
        exhaust_phase(&mut engine);
        assert!(engine.breath().is_active());

        engine.reset_all();
        assert_eq!(engine.phase(), SessionPhase::Idle);
        assert_eq!(engine.app_phase(), AppPhase::Idle);
        assert!(!engine.is_running());
        assert_eq!(engine.seconds_left(), 60);
        assert!(!engine.breath().is_active());
    }

    #[test]
    fn start_from_paused_break_stops_breathing() {
        let mut engine = short_engine();
        engine.start_focus();
        exhaust_phase(&mut engine);
        engine.pause_focus();
        assert!(engine.breath().is_active());

        engine.start_focus();
        assert_eq!(engine.phase(), SessionPhase::Work);
        assert!(!engine.breath().is_active());
    }

    #[test]
    fn settings_apply_only_to_next_session() {
        let mut engine = SessionEngine::new(SessionSettings {
            work_minutes: 2,
            break_minutes: 1,
        });
        engine.start_focus();
        engine.tick();
        engine.set_settings(SessionSettings {
            work_minutes: 50,
            break_minutes: 10,
        });
        // Active countdown untouched.
        assert_eq!(engine.seconds_left(), 2 * 60 - 1);
        assert!((engine.timer_progress() - 1.0 / 120.0).abs() < 1e-9);

        engine.reset_all();
        assert_eq!(engine.seconds_left(), 50 * 60);
    }

    #[test]
    fn settings_apply_immediately_when_idle() {
        let mut engine = SessionEngine::new(SessionSettings::default());
        engine.set_settings(SessionSettings {
            work_minutes: 10,
            break_minutes: 2,
        });
        assert_eq!(engine.seconds_left(), 10 * 60);
        engine.start_focus();
        assert_eq!(engine.seconds_left(), 10 * 60);
    }

    #[test]
    fn progress_spans_zero_to_one() {
        let mut engine = short_engine();
        engine.start_focus();
        assert_eq!(engine.timer_progress(), 0.0);
        let mut last = 0.0;
        while engine.seconds_left() > 0 {
            engine.tick();
            let p = engine.timer_progress();
            assert!(p >= last);
            last = p;
        }
        assert_eq!(engine.timer_progress(), 1.0);
    }

    #[test]
    fn display_formats_mm_ss() {
        let mut engine = SessionEngine::new(SessionSettings {
            work_minutes: 25,
            break_minutes: 5,
        });
        assert_eq!(engine.timer_display(), "25:00");
        engine.start_focus();
        engine.tick();
        assert_eq!(engine.timer_display(), "24:59");
    }

    #[test]
    fn snapshot_publishes_engine_state() {
        let engine = SessionEngine::new(SessionSettings::default());
        match engine.snapshot() {
            Event::StateSnapshot {
                phase,
                app_phase,
                seconds_left,
                is_running,
                sessions_today,
                ..
            } => {
                assert_eq!(phase, SessionPhase::Idle);
                assert_eq!(app_phase, AppPhase::Idle);
                assert_eq!(seconds_left, 25 * 60);
                assert!(!is_running);
                assert_eq!(sessions_today, 0);
            }
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }
    }

    proptest! {
        /// `MM:SS` always renders both fields with at least two digits
        /// and a matching seconds value.
        #[test]
        fn display_is_zero_padded(secs in 0u64..600 * 60) {
            let mut engine = SessionEngine::new(SessionSettings {
                work_minutes: 600,
                break_minutes: 5,
            });
            engine.start_focus();
            // Drain down to the target without ticking through everything.
            for _ in 0..(600 * 60 - secs) {
                engine.tick();
            }
            let display = engine.timer_display();
            let (m, s) = display.split_once(':').unwrap();
            prop_assert!(m.len() >= 2);
            prop_assert_eq!(s.len(), 2);
            prop_assert_eq!(s.parse::<u64>().unwrap(), secs % 60);
        }

        /// Progress stays in [0, 1] and is 1 exactly at zero seconds.
        #[test]
        fn progress_bounds(work_minutes in 1u32..120) {
            let mut engine = SessionEngine::new(SessionSettings {
                work_minutes,
                break_minutes: 5,
            });
            engine.start_focus();
            while engine.seconds_left() > 0 {
                let p = engine.timer_progress();
                prop_assert!((0.0..=1.0).contains(&p));
                engine.tick();
            }
            prop_assert_eq!(engine.timer_progress(), 1.0);
        }
    }
}

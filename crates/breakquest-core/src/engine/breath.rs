//! Breathing mini-game sub-timer.
//!
//! Active only while the session is on break. Cycles through a fixed
//! inhale/hold/exhale sequence; a full lap through all three phases
//! counts as one completed breath cycle.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreathPhase {
    Inhale,
    Hold,
    Exhale,
}

impl BreathPhase {
    /// One breath cycle, in order. Total 10 seconds.
    pub const SEQUENCE: [BreathPhase; 3] =
        [BreathPhase::Inhale, BreathPhase::Hold, BreathPhase::Exhale];

    pub fn duration_secs(self) -> f64 {
        match self {
            BreathPhase::Inhale => 4.0,
            BreathPhase::Hold => 2.0,
            BreathPhase::Exhale => 4.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BreathPhase::Inhale => "Breathe in…",
            BreathPhase::Hold => "Hold…",
            BreathPhase::Exhale => "Breathe out…",
        }
    }
}

/// Outcome of a tick that crossed a phase boundary.
#[derive(Debug, Clone, Copy)]
pub struct BreathAdvance {
    /// The phase just entered.
    pub phase: BreathPhase,
    /// True when the advance wrapped back to inhale, completing a lap.
    pub completed_cycle: bool,
}

/// Breathing-cycle state machine.
///
/// Like the session engine, it has no internal timer -- the caller ticks
/// it at a fine granularity (e.g. every 50 ms) while it is active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreathCycle {
    index: usize,
    elapsed: f64,
    progress: f64,
    cycles: u64,
    active: bool,
}

impl BreathCycle {
    pub fn new() -> Self {
        Self {
            index: 0,
            elapsed: 0.0,
            progress: 0.0,
            cycles: 0,
            active: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn phase(&self) -> BreathPhase {
        BreathPhase::SEQUENCE[self.index]
    }

    /// 0.0 .. 1.0 progress within the current breath phase.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Completed full laps since the last `start()`.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a fresh breathing run, discarding any previous state.
    pub fn start(&mut self) {
        self.index = 0;
        self.elapsed = 0.0;
        self.progress = 0.0;
        self.cycles = 0;
        self.active = true;
    }

    /// Cease ticking. Idempotent; `cycles` is retained until the next
    /// `start()`.
    pub fn stop(&mut self) {
        self.active = false;
    }

    /// Advance by `dt` seconds. Returns `Some` when a phase boundary was
    /// crossed. The completion check uses `>=`, so coarse ticks that
    /// overshoot a phase are tolerated and never skip one.
    pub fn tick(&mut self, dt: f64) -> Option<BreathAdvance> {
        if !self.active {
            return None;
        }
        self.elapsed += dt;
        let total = self.phase().duration_secs();
        self.progress = (self.elapsed / total).min(1.0);

        if self.elapsed >= total {
            self.elapsed = 0.0;
            self.index = (self.index + 1) % BreathPhase::SEQUENCE.len();
            self.progress = 0.0;
            let completed_cycle = self.index == 0;
            if completed_cycle {
                self.cycles += 1;
            }
            return Some(BreathAdvance {
                phase: self.phase(),
                completed_cycle,
            });
        }
        None
    }
}

impl Default for BreathCycle {
    fn default() -> Self {
        Self::new()
    }
}

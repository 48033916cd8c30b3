//! # BreakQuest Core Library
//!
//! This library provides the core business logic for BreakQuest, a
//! Pomodoro-style focus timer gamified with a breathing mini-game and
//! loot rewards. All operations are available via a standalone CLI
//! binary; any richer front-end is a thin presentation layer over the
//! same core library.
//!
//! ## Architecture
//!
//! - **Session Engine**: A tick-driven state machine that requires the
//!   caller to periodically invoke `tick()` for countdown progress
//! - **Breath Cycle Engine**: A sub-timer active during breaks, ticked
//!   at a finer granularity
//! - **Reward Allocator**: Seedable random selection from a fixed loot
//!   pool, gated on completed breath cycles
//! - **Storage**: SQLite-based counters/inventory and TOML-based
//!   configuration
//!
//! ## Key Components
//!
//! - [`SessionEngine`]: Core session state machine
//! - [`BreathCycle`]: Breathing-game sub-timer
//! - [`LootAllocator`]: Reward eligibility and selection
//! - [`Database`]: Counter, inventory and session-log persistence
//! - [`Config`]: Application configuration management

pub mod engine;
pub mod error;
pub mod events;
pub mod storage;

pub use engine::{
    AppPhase, BreathCycle, BreathPhase, LootAllocator, LootItem, SessionEngine, SessionPhase,
    SessionSettings,
};
pub use error::{ConfigError, CoreError, DatabaseError};
pub use events::Event;
pub use storage::{Config, Database};

mod breath;
mod loot;
mod session;

pub use breath::{BreathAdvance, BreathCycle, BreathPhase};
pub use loot::{LootAllocator, LootItem, AWARD_CYCLE_THRESHOLD};
pub use session::{AppPhase, SessionEngine, SessionPhase, SessionSettings};

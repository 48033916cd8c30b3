//! Loot pool and reward allocation.
//!
//! Rewards are cosmetic items drawn uniformly, with replacement, from a
//! fixed pool. Eligibility is decided by the number of breath cycles
//! completed during the break.

use std::sync::LazyLock;

use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Breath cycles required within a single break to earn a reward.
pub const AWARD_CYCLE_THRESHOLD: u64 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootItem {
    pub id: Uuid,
    pub icon: String,
    pub name: String,
}

impl LootItem {
    fn new(icon: &str, name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            icon: icon.to_string(),
            name: name.to_string(),
        }
    }

    /// The fixed reward pool: 10 items with pairwise-distinct icons.
    pub fn pool() -> &'static [LootItem] {
        static POOL: LazyLock<Vec<LootItem>> = LazyLock::new(|| {
            vec![
                LootItem::new("🗡️", "Iron Dagger"),
                LootItem::new("⚔️", "Twin Swords"),
                LootItem::new("🛡️", "Round Shield"),
                LootItem::new("👑", "Golden Crown"),
                LootItem::new("💎", "Blue Gem"),
                LootItem::new("🪄", "Magic Wand"),
                LootItem::new("🏺", "Ancient Urn"),
                LootItem::new("🔮", "Crystal Ball"),
                LootItem::new("🪙", "Gold Coin"),
                LootItem::new("🧿", "Nazar Amulet"),
            ]
        });
        &POOL
    }
}

/// Picks rewards from the pool.
///
/// Wraps a small PCG generator so award scenarios can be made
/// deterministic with a seed.
#[derive(Debug, Clone)]
pub struct LootAllocator {
    rng: Mcg128Xsl64,
}

impl LootAllocator {
    pub fn new() -> Self {
        Self {
            rng: Mcg128Xsl64::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mcg128Xsl64::seed_from_u64(seed),
        }
    }

    /// Decide eligibility and pick one reward.
    ///
    /// Below the cycle threshold this returns `None` and mutates
    /// nothing. At or above it, one pool member is chosen uniformly at
    /// random; the same item can be awarded more than once.
    pub fn evaluate(&mut self, cycles_completed: u64) -> Option<LootItem> {
        if cycles_completed < AWARD_CYCLE_THRESHOLD {
            return None;
        }
        LootItem::pool().choose(&mut self.rng).cloned()
    }
}

impl Default for LootAllocator {
    fn default() -> Self {
        Self::new()
    }
}

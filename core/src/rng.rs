//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulation may call any platform RNG.
//! All randomness flows through SubsystemRng instances derived
//! from the single master seed recorded on the run. The only
//! exception is `fresh_seed()`, which picks that master seed when
//! the caller did not supply one.
//!
//! Each subsystem gets its own RNG stream per round, seeded
//! deterministically from (master_seed, slot, round). This means:
//!   - Adding a new slot never changes existing slots' streams.
//!   - Drawing more tickets in one round never shifts the draw.
//!   - Any round is reproducible in isolation.

use rand::{Rng, RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

const SLOT_MIX: u64 = 0x9e37_79b9_7f4a_7c15;
const ROUND_MIX: u64 = 0xc2b2_ae3d_27d4_eb4f;

/// A uniform random source. The simulation only ever needs uniform
/// choices from a finite domain and uniform integers in a range.
pub trait RandomSource {
    /// Draw a raw u64 (full range).
    fn next_u64(&mut self) -> u64;

    /// Uniform u64 in [0, n). `n` must be > 0.
    fn below(&mut self, n: u64) -> u64;

    /// Uniform u64 in [lo, hi]. Returns `lo` when `hi <= lo`.
    fn range_inclusive(&mut self, lo: u64, hi: u64) -> u64 {
        if hi <= lo {
            return lo;
        }
        match (hi - lo).checked_add(1) {
            Some(span) => lo + self.below(span),
            None => self.next_u64(),
        }
    }
}

/// A named, deterministic RNG for a single subsystem.
pub struct SubsystemRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl SubsystemRng {
    /// Create a subsystem RNG from an already-derived seed.
    pub fn new(seed: u64) -> Self {
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

impl RandomSource for SubsystemRng {
    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.gen_range(0..n)
    }
}

/// All subsystem RNGs for a single run, indexed by stable slot.
#[derive(Debug, Clone, Copy)]
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    pub fn for_subsystem_at_round(&self, slot: SubsystemSlot, round: u64) -> SubsystemRng {
        let derived_seed = self.master_seed
            ^ (slot as u64).wrapping_add(1).wrapping_mul(SLOT_MIX)
            ^ round.wrapping_add(1).wrapping_mul(ROUND_MIX);
        SubsystemRng::new(derived_seed).with_name(slot.name())
    }
}

/// Stable subsystem slot assignments.
/// NEVER reorder or remove entries, only append.
/// Reordering changes every subsystem's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum SubsystemSlot {
    Population = 0,
    Tickets = 1,
    Draw = 2,
}

impl SubsystemSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Population => "population",
            Self::Tickets => "tickets",
            Self::Draw => "draw",
        }
    }
}

/// Pick a master seed from the platform RNG. Callers must record it:
/// this is the only way to reproduce an unseeded run after the fact.
pub fn fresh_seed() -> u64 {
    rand::thread_rng().gen()
}

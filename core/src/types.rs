//! Shared primitive types used across the entire simulation.

/// A lottery round, 0-indexed. One round = one draw.
pub type Round = u64;

/// A single lottery number drawn from the configured domain.
pub type Number = i64;

/// How many numbers a ticket shares with the winning combination.
pub type MatchCount = u32;

/// The canonical run identifier.
pub type RunId = String;

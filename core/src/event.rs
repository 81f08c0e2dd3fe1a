//! The run event log vocabulary.
//!
//! RULE: every ledger movement in a round is recorded as an event.
//! Replaying the events of a round reproduces its accounting.

use crate::{
    ticket::WinningCombination,
    types::{MatchCount, Round, RunId},
};
use serde::{Deserialize, Serialize};

/// Every event emitted during simulation.
/// Variants are appended only, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Engine events ──────────────────────────────
    RunInitialized {
        run_id: RunId,
        seed: u64,
    },
    RoundStarted {
        round: Round,
        user_count: u64,
        min_users: u64,
    },
    RoundCompleted {
        round: Round,
        payout_total: f64,
        balance: f64,
        house_revenue: f64,
    },

    // ── Ledger events ──────────────────────────────
    TicketsSold {
        round: Round,
        ticket_count: u64,
        pot_credit: f64,
        house_credit: f64,
    },
    HouseSkimmed {
        round: Round,
        amount: f64,
    },
    FloorTransferred {
        round: Round,
        amount: f64,
    },
    LeftoverSwept {
        round: Round,
        amount: f64,
    },

    // ── Draw and payout events ─────────────────────
    WinningNumbersDrawn {
        round: Round,
        numbers: WinningCombination,
    },
    JackpotAwarded {
        round: Round,
        match_count: MatchCount,
        ticket_index: usize,
        gross_amount: f64,
        house_cut: f64,
    },
}

impl SimEvent {
    /// Stable string name for the event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::RunInitialized { .. }      => "run_initialized",
            Self::RoundStarted { .. }        => "round_started",
            Self::RoundCompleted { .. }      => "round_completed",
            Self::TicketsSold { .. }         => "tickets_sold",
            Self::HouseSkimmed { .. }        => "house_skimmed",
            Self::FloorTransferred { .. }    => "floor_transferred",
            Self::LeftoverSwept { .. }       => "leftover_swept",
            Self::WinningNumbersDrawn { .. } => "winning_numbers_drawn",
            Self::JackpotAwarded { .. }      => "jackpot_awarded",
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub run_id: RunId,
    pub round: Round,
    pub event_type: String,
    pub payload: String, // JSON-serialized SimEvent
}

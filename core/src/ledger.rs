//! Pot and house accounting.
//!
//! ROUND ORDER (fixed, applied by the round simulator):
//!   1. sell_tickets      : 95% of sales to the pot, 5% to the house
//!   2. skim              : PotSkim policy only, before any jackpot
//!   3. (payout evaluation happens outside the ledger)
//!   4. settle_payouts    : debit ticket payouts and the house jackpot cut
//!   5. close_round       : floor transfer OR leftover sweep, never both
//!
//! RULE: house_revenue is never clamped. A negative value means the
//! house has been subsidising the floor, and the run must show it.

use crate::config::LeftoverPolicy;
use serde::{Deserialize, Serialize};

pub const POT_SHARE_OF_SALES: f64 = 0.95;
pub const HOUSE_SHARE_OF_SALES: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    /// The pot.
    pub balance: f64,
    /// Cumulative operator take. May be negative.
    pub house_revenue: f64,
}

/// Credits produced by one round's ticket sales.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub pot_credit: f64,
    pub house_credit: f64,
}

/// What the end-of-round floor/leftover step did.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoundClose {
    Unchanged,
    /// House revenue moved into the pot to restore the floor.
    FloorTransfer { amount: f64 },
    /// Pot surplus above the floor moved into house revenue.
    LeftoverSweep { amount: f64 },
}

impl LedgerState {
    /// Ledger at run start: the floor plus any seed money.
    pub fn open(min_pot: f64, starting_pot: f64) -> Self {
        Self {
            balance: min_pot + starting_pot,
            house_revenue: 0.0,
        }
    }

    /// Total money held by pot and house together.
    pub fn total(&self) -> f64 {
        self.balance + self.house_revenue
    }

    pub fn sell_tickets(&mut self, ticket_count: u64, price: f64) -> Sale {
        let gross = ticket_count as f64 * price;
        let sale = Sale {
            pot_credit: gross * POT_SHARE_OF_SALES,
            house_credit: gross * HOUSE_SHARE_OF_SALES,
        };
        self.balance += sale.pot_credit;
        self.house_revenue += sale.house_credit;
        sale
    }

    /// Move `pct` of the pot into house revenue. Returns the amount moved.
    pub fn skim(&mut self, pct: f64) -> f64 {
        let delta = self.balance * pct;
        self.balance -= delta;
        self.house_revenue += delta;
        delta
    }

    /// Debit the round's ticket payouts and the house's jackpot cut from
    /// the pot; the cut is credited to house revenue.
    pub fn settle_payouts(&mut self, payout_total: f64, jackpot_house_cut: f64) {
        self.balance -= payout_total + jackpot_house_cut;
        self.house_revenue += jackpot_house_cut;
    }

    /// Apply floor protection, or failing that the leftover sweep.
    pub fn close_round(&mut self, min_pot: f64, leftovers: LeftoverPolicy) -> RoundClose {
        if self.balance < min_pot {
            let amount = min_pot - self.balance;
            self.balance = min_pot;
            self.house_revenue -= amount;
            return RoundClose::FloorTransfer { amount };
        }
        if self.balance > min_pot && leftovers == LeftoverPolicy::SweepToHouse {
            let amount = self.balance - min_pot;
            self.balance = min_pot;
            self.house_revenue += amount;
            return RoundClose::LeftoverSweep { amount };
        }
        RoundClose::Unchanged
    }
}

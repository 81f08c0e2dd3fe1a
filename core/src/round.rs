//! One lottery round, start to finish.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Draw the user count, then each user's ticket batch
//!   2. Draw the winning combination
//!   3. Sell tickets into the ledger
//!   4. Skim the pot (PotSkim policy only)
//!   5. Evaluate payouts in batch order
//!   6. Settle payouts against the pot
//!   7. Floor transfer or leftover sweep
//!
//! The ledger goes in by value and comes back out in the outcome;
//! the round never holds on to it.

use crate::{
    config::{HouseTakePolicy, LottoConfig},
    event::SimEvent,
    ledger::{LedgerState, RoundClose},
    payout::{JackpotAward, PayoutRules},
    population::PopulationModel,
    rng::{RngBank, SubsystemSlot},
    stats::PayoutSample,
    ticket::{self, Ticket, WinningCombination},
    types::{MatchCount, Round},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundMetrics {
    pub round: Round,
    pub user_count: u64,
    pub ticket_count: u64,
    /// Sum of all ticket payouts this round.
    pub payout_total: f64,
    /// House share of jackpots, debited from the pot with the payouts.
    pub jackpot_house_cut: f64,
    pub balance_after: f64,
    pub house_revenue_after: f64,
    pub match_count_histogram: BTreeMap<MatchCount, u64>,
}

/// Every player ticket sold in a round, in canonical order.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketBatch {
    pub user_count: u64,
    pub tickets: Vec<Ticket>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundOutcome {
    pub ledger: LedgerState,
    pub metrics: RoundMetrics,
    pub ticket_payouts: Vec<f64>,
    pub jackpots: Vec<JackpotAward>,
    pub samples: Vec<PayoutSample>,
    pub close: RoundClose,
    pub events: Vec<SimEvent>,
}

pub struct RoundSimulator<'a> {
    config: &'a LottoConfig,
    rules: PayoutRules,
}

impl<'a> RoundSimulator<'a> {
    pub fn new(config: &'a LottoConfig) -> Self {
        Self {
            config,
            rules: PayoutRules::from_config(config),
        }
    }

    /// Run a full round: generate players and tickets, draw, settle.
    pub fn play(
        &self,
        round: Round,
        ledger: LedgerState,
        population: &mut PopulationModel,
        rng_bank: &RngBank,
    ) -> RoundOutcome {
        let min_users = population.min_users;
        let batch = self.generate_batch(round, population, rng_bank);

        let mut draw_rng = rng_bank.for_subsystem_at_round(SubsystemSlot::Draw, round);
        let winning = ticket::draw(&self.config.domain, self.config.n, &mut draw_rng);

        let mut outcome = self.settle(round, ledger, &batch, &winning);
        outcome.events.insert(
            0,
            SimEvent::RoundStarted {
                round,
                user_count: batch.user_count,
                min_users,
            },
        );
        outcome
    }

    /// Users and their tickets for `round`, flattened in user order.
    /// Ratchets the population's lower bound as a side effect.
    pub fn generate_batch(
        &self,
        round: Round,
        population: &mut PopulationModel,
        rng_bank: &RngBank,
    ) -> TicketBatch {
        let mut user_rng = rng_bank.for_subsystem_at_round(SubsystemSlot::Population, round);
        let mut ticket_rng = rng_bank.for_subsystem_at_round(SubsystemSlot::Tickets, round);

        let user_count = population.draw_user_count(round, &mut user_rng);
        let mut tickets = Vec::new();
        for _ in 0..user_count {
            let requested = population.draw_ticket_count(&mut user_rng);
            tickets.extend(ticket::generate_user_batch(
                &self.config.domain,
                self.config.n,
                requested,
                &mut ticket_rng,
            ));
        }
        TicketBatch { user_count, tickets }
    }

    /// Ledger steps for a known batch and draw.
    pub fn settle(
        &self,
        round: Round,
        mut ledger: LedgerState,
        batch: &TicketBatch,
        winning: &WinningCombination,
    ) -> RoundOutcome {
        let ticket_count = batch.tickets.len() as u64;
        let mut events = vec![SimEvent::WinningNumbersDrawn {
            round,
            numbers: winning.clone(),
        }];

        let sale = ledger.sell_tickets(ticket_count, self.config.price);
        events.push(SimEvent::TicketsSold {
            round,
            ticket_count,
            pot_credit: sale.pot_credit,
            house_credit: sale.house_credit,
        });

        if let HouseTakePolicy::PotSkim { pct } = self.config.house_take {
            let amount = ledger.skim(pct);
            events.push(SimEvent::HouseSkimmed { round, amount });
        }

        let payouts = self.rules.evaluate(&batch.tickets, winning, ledger.balance);
        events.extend(payouts.jackpots.iter().map(|j| SimEvent::JackpotAwarded {
            round,
            match_count: j.match_count,
            ticket_index: j.ticket_index,
            gross_amount: j.gross_amount,
            house_cut: j.house_cut,
        }));

        ledger.settle_payouts(payouts.payout_total, payouts.house_cut);

        let close = ledger.close_round(self.config.min_pot, self.config.leftovers);
        match close {
            RoundClose::FloorTransfer { amount } => {
                events.push(SimEvent::FloorTransferred { round, amount })
            }
            RoundClose::LeftoverSweep { amount } => {
                events.push(SimEvent::LeftoverSwept { round, amount })
            }
            RoundClose::Unchanged => {}
        }

        events.push(SimEvent::RoundCompleted {
            round,
            payout_total: payouts.payout_total,
            balance: ledger.balance,
            house_revenue: ledger.house_revenue,
        });

        let metrics = RoundMetrics {
            round,
            user_count: batch.user_count,
            ticket_count,
            payout_total: payouts.payout_total,
            jackpot_house_cut: payouts.house_cut,
            balance_after: ledger.balance,
            house_revenue_after: ledger.house_revenue,
            match_count_histogram: payouts.histogram,
        };

        RoundOutcome {
            ledger,
            metrics,
            ticket_payouts: payouts.ticket_payouts,
            jackpots: payouts.jackpots,
            samples: payouts.samples,
            close,
            events,
        }
    }
}

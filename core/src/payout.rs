//! Payout rules: fixed incentives and single-trigger jackpots.
//!
//! Tickets are evaluated strictly in batch order (user index, then
//! per-user generation order). A percentage tier pays out to the
//! FIRST ticket that hits its match count and to no other ticket in
//! the same round. Evaluating in any other order changes who gets
//! the jackpot, so this pass must never be parallelised or reordered.

use crate::{
    config::{HouseTakePolicy, IncentiveScaling, LottoConfig},
    stats::PayoutSample,
    ticket::{Ticket, WinningCombination},
    types::MatchCount,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JackpotAward {
    pub match_count: MatchCount,
    /// Position of the winning ticket in the round's batch.
    pub ticket_index: usize,
    /// Taken from the pot: ticket share plus house cut.
    pub gross_amount: f64,
    pub house_cut: f64,
}

impl JackpotAward {
    pub fn ticket_amount(&self) -> f64 {
        self.gross_amount - self.house_cut
    }
}

/// Result of evaluating one round's batch against its draw.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PayoutRound {
    /// One entry per ticket, in batch order.
    pub ticket_payouts: Vec<f64>,
    /// Sum of `ticket_payouts`.
    pub payout_total: f64,
    /// House share of jackpots; debited from the pot alongside payouts.
    pub house_cut: f64,
    pub histogram: BTreeMap<MatchCount, u64>,
    pub jackpots: Vec<JackpotAward>,
    /// One sample per ticket with a nonzero payout.
    pub samples: Vec<PayoutSample>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PayoutRules {
    price: f64,
    incentives: BTreeMap<MatchCount, f64>,
    pot_percents: BTreeMap<MatchCount, f64>,
    house_take: HouseTakePolicy,
    scaling: IncentiveScaling,
}

impl PayoutRules {
    pub fn from_config(config: &LottoConfig) -> Self {
        Self {
            price: config.price,
            incentives: config.payout_incentives.clone(),
            pot_percents: config.payout_pot_percents.clone(),
            house_take: config.house_take,
            scaling: config.incentive_scaling,
        }
    }

    /// Incentive per ticket for `match_count` in a round selling
    /// `ticket_count` tickets, if that tier is configured.
    pub fn incentive_for(&self, match_count: MatchCount, ticket_count: u64) -> Option<f64> {
        let base = *self.incentives.get(&match_count)?;
        Some(match self.scaling {
            IncentiveScaling::Fixed => base,
            IncentiveScaling::StepUp { ticket_count: step } => {
                let steps = ticket_count as f64 / step as f64;
                let factor = ((steps + 1.0).log2() + 1.0).powf(1.5);
                (base * factor).max(self.price)
            }
        })
    }

    /// Evaluate every ticket against the draw.
    ///
    /// `pot_balance` is the pot after sales and any skim, before this
    /// round's payouts; every jackpot is a fraction of that same value.
    pub fn evaluate(
        &self,
        tickets: &[Ticket],
        winning: &WinningCombination,
        pot_balance: f64,
    ) -> PayoutRound {
        let ticket_count = tickets.len() as u64;
        let incentives: BTreeMap<MatchCount, f64> = self
            .incentives
            .keys()
            .filter_map(|&k| self.incentive_for(k, ticket_count).map(|v| (k, v)))
            .collect();

        let mut triggered: BTreeSet<MatchCount> = BTreeSet::new();
        let mut round = PayoutRound {
            ticket_payouts: Vec::with_capacity(tickets.len()),
            ..PayoutRound::default()
        };

        for (index, ticket) in tickets.iter().enumerate() {
            let matched = ticket.match_count(winning);
            *round.histogram.entry(matched).or_insert(0) += 1;

            let mut ticket_payout = 0.0;

            if let Some(&incentive) = incentives.get(&matched) {
                ticket_payout += incentive;
            }

            if let Some(&pct) = self.pot_percents.get(&matched) {
                if triggered.insert(matched) {
                    let gross_amount = pct * pot_balance;
                    let house_cut = self.house_take.jackpot_cut(gross_amount);
                    let award = JackpotAward {
                        match_count: matched,
                        ticket_index: index,
                        gross_amount,
                        house_cut,
                    };
                    ticket_payout += award.ticket_amount();
                    round.house_cut += house_cut;
                    round.jackpots.push(award);
                }
            }

            if ticket_payout != 0.0 {
                round.samples.push(PayoutSample {
                    match_count: matched,
                    amount: ticket_payout,
                });
            }
            round.payout_total += ticket_payout;
            round.ticket_payouts.push(ticket_payout);
        }

        round
    }
}

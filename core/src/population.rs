//! User growth model: how many players show up each round and how
//! many tickets each of them asks for.
//!
//! The upper bound on users follows an adoption S-curve over the run.
//! The lower bound ratchets up 2% per round until it reaches half of
//! `max_users`, and never comes back down.

use crate::{config::LottoConfig, rng::RandomSource, types::Round};
use serde::{Deserialize, Serialize};

pub const MIN_USERS_GROWTH: f64 = 1.02;

/// Adoption S-curve in (0, 1) for round `round` of `n_rounds`.
pub fn adoption_curve(round: Round, n_rounds: u64) -> f64 {
    let t = round as f64;
    let progress = 100.0 * (t / 2.0 + 1.0) / n_rounds.max(1) as f64;
    1.0 / (1.0 + (-progress.powf(0.4) + 2.0).exp())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationModel {
    pub min_users: u64,
    pub max_users: u64,
    pub min_tickets_per_user: u64,
    pub max_tickets_per_user: u64,
    pub n_rounds: u64,
}

impl PopulationModel {
    pub fn from_config(config: &LottoConfig) -> Self {
        Self {
            min_users: config.min_users,
            max_users: config.max_users,
            min_tickets_per_user: config.min_tickets_per_user,
            max_tickets_per_user: config.max_tickets_per_user,
            n_rounds: config.rounds,
        }
    }

    /// Upper bound on this round's user count, before drawing.
    pub fn user_ceiling(&self, round: Round) -> u64 {
        let spread = self.max_users.saturating_sub(self.min_users) as f64;
        let ceiling = self.min_users as f64 + adoption_curve(round, self.n_rounds) * spread;
        (ceiling.floor() as u64).clamp(self.min_users, self.max_users)
    }

    /// Draw this round's user count, then ratchet the lower bound.
    pub fn draw_user_count<R: RandomSource>(&mut self, round: Round, rng: &mut R) -> u64 {
        let users = rng.range_inclusive(self.min_users, self.user_ceiling(round));
        self.ratchet_min_users();
        users
    }

    fn ratchet_min_users(&mut self) {
        if (self.min_users as f64) < 0.5 * self.max_users as f64 {
            self.min_users = (self.min_users as f64 * MIN_USERS_GROWTH).floor() as u64;
        }
    }

    /// Tickets one user asks for, before the capacity clamp.
    pub fn draw_ticket_count<R: RandomSource>(&self, rng: &mut R) -> u64 {
        rng.range_inclusive(self.min_tickets_per_user, self.max_tickets_per_user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adoption_curve_rises_across_the_run() {
        let early = adoption_curve(0, 1_000);
        let late = adoption_curve(999, 1_000);
        assert!(early > 0.0 && early < late && late < 1.0);
    }

    #[test]
    fn adoption_curve_matches_closed_form() {
        let first = 1.0 / (1.0 + (-(1.0f64).powf(0.4) + 2.0).exp());
        assert!((adoption_curve(0, 100) - first).abs() < 1e-12);

        // round 98 of 100: 100 * (49 + 1) / 100 = 50
        let late = 1.0 / (1.0 + (-(50.0f64).powf(0.4) + 2.0).exp());
        assert!((adoption_curve(98, 100) - late).abs() < 1e-12);
    }

    #[test]
    fn ratchet_truncates_and_stops_at_half_max() {
        let mut model = PopulationModel {
            min_users: 100,
            max_users: 220,
            min_tickets_per_user: 1,
            max_tickets_per_user: 1,
            n_rounds: 10,
        };
        model.ratchet_min_users();
        assert_eq!(model.min_users, 102);
        for _ in 0..20 {
            model.ratchet_min_users();
        }
        // 110 is half of 220; growth stops at the first value not below it.
        assert!(model.min_users >= 110 && model.min_users < 113);
        let frozen = model.min_users;
        model.ratchet_min_users();
        assert_eq!(model.min_users, frozen);
    }

    #[test]
    fn small_minimum_never_moves() {
        let mut model = PopulationModel {
            min_users: 1,
            max_users: 100,
            min_tickets_per_user: 1,
            max_tickets_per_user: 1,
            n_rounds: 10,
        };
        model.ratchet_min_users();
        assert_eq!(model.min_users, 1);
    }
}

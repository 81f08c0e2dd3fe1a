//! The simulation driver. Runs rounds in sequence and owns every
//! piece of state that crosses a round boundary.
//!
//! RULES:
//!   - Rounds run strictly in order. Round t+1 starts from round t's
//!     ledger and from the ratcheted user floor; nothing else carries.
//!   - All randomness flows through the RngBank.
//!   - Every round's events and metrics are recorded in the store.

use crate::{
    config::LottoConfig,
    error::{SimError, SimResult},
    event::{EventLogEntry, SimEvent},
    ledger::{LedgerState, RoundClose},
    population::PopulationModel,
    report::SimReport,
    rng::RngBank,
    round::{RoundMetrics, RoundSimulator},
    stats::{PayoutBook, TimeSeries},
    store::SimStore,
    types::{Round, RunId},
};

pub struct SimEngine {
    pub run_id:     RunId,
    pub rng_bank:   RngBank,
    pub store:      SimStore,
    config:         LottoConfig,
    seed:           u64,
    next_round:     Round,
    ledger:         LedgerState,
    population:     PopulationModel,
    payouts:        PayoutBook,
    series:         TimeSeries,
    metrics:        Vec<RoundMetrics>,
    floor_transfers: u64,
    lowest_house_revenue: f64,
}

impl SimEngine {
    /// Build an engine for a validated config. The store must already
    /// be migrated and hold a `run` row for `run_id`.
    pub fn new(run_id: RunId, seed: u64, config: LottoConfig, store: SimStore) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            rng_bank:   RngBank::new(seed),
            ledger:     LedgerState::open(config.min_pot, config.starting_pot),
            population: PopulationModel::from_config(&config),
            payouts:    PayoutBook::new(),
            series:     TimeSeries::default(),
            metrics:    Vec::new(),
            next_round: 0,
            floor_transfers: 0,
            lowest_house_revenue: 0.0,
            config,
            seed,
            store,
            run_id,
        })
    }

    /// Engine over an in-memory store with `LottoConfig::default_test()`.
    pub fn build_test(run_id: RunId, seed: u64) -> SimResult<Self> {
        Self::build_in_memory(run_id, seed, LottoConfig::default_test())
    }

    /// Engine over a fresh in-memory store.
    pub fn build_in_memory(run_id: RunId, seed: u64, config: LottoConfig) -> SimResult<Self> {
        let store = SimStore::in_memory()?;
        store.migrate()?;
        store.insert_run(&run_id, seed, env!("CARGO_PKG_VERSION"), "")?;
        Self::new(run_id, seed, config, store)
    }

    pub fn config(&self) -> &LottoConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn ledger(&self) -> LedgerState {
        self.ledger
    }

    pub fn population(&self) -> &PopulationModel {
        &self.population
    }

    pub fn rounds_completed(&self) -> u64 {
        self.next_round
    }

    pub fn is_complete(&self) -> bool {
        self.next_round >= self.config.rounds
    }

    pub fn metrics(&self) -> &[RoundMetrics] {
        &self.metrics
    }

    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    pub fn payout_book(&self) -> &PayoutBook {
        &self.payouts
    }

    /// Advance one round. This is the core simulation step.
    pub fn run_round(&mut self) -> SimResult<RoundMetrics> {
        if self.is_complete() {
            return Err(SimError::RunComplete { rounds: self.config.rounds });
        }
        let round = self.next_round;

        // Engine state is committed only after the round's log write succeeds.
        let mut population = self.population.clone();
        let simulator = RoundSimulator::new(&self.config);
        let outcome = simulator.play(round, self.ledger, &mut population, &self.rng_bank);

        let mut entries = Vec::with_capacity(outcome.events.len() + 1);
        if round == 0 {
            entries.push(self.log_entry(0, &SimEvent::RunInitialized {
                run_id: self.run_id.clone(),
                seed:   self.seed,
            })?);
        }
        for event in &outcome.events {
            log::debug!("round={} {:?}", round + 1, event);
            entries.push(self.log_entry(round, event)?);
        }
        self.store.save_round(&self.run_id, &entries, &outcome.metrics)?;
        self.population = population;

        if let RoundClose::FloorTransfer { .. } = outcome.close {
            self.floor_transfers += 1;
        }
        if outcome.ledger.house_revenue < 0.0 && self.ledger.house_revenue >= 0.0 {
            log::warn!(
                "round={} house revenue went negative ({:.2}): pot floor is underfunded",
                round + 1,
                outcome.ledger.house_revenue
            );
        }
        self.lowest_house_revenue = self.lowest_house_revenue.min(outcome.ledger.house_revenue);

        self.ledger = outcome.ledger;
        self.payouts.record_all(&outcome.samples);
        self.series.push(&outcome.metrics);
        self.metrics.push(outcome.metrics.clone());
        self.next_round += 1;

        log::info!(
            "Round {}: users={} tickets={} matches={:?} pot={:.2} house={:.2}",
            round + 1,
            outcome.metrics.user_count,
            outcome.metrics.ticket_count,
            outcome.metrics.match_count_histogram,
            outcome.metrics.balance_after,
            outcome.metrics.house_revenue_after,
        );

        Ok(outcome.metrics)
    }

    /// Run up to `n` rounds, stopping early at the configured total.
    pub fn run_rounds(&mut self, n: u64) -> SimResult<()> {
        for _ in 0..n {
            if self.is_complete() {
                break;
            }
            self.run_round()?;
        }
        Ok(())
    }

    /// Run every remaining round.
    pub fn run(&mut self) -> SimResult<()> {
        self.run_rounds(self.config.rounds.saturating_sub(self.next_round))
    }

    /// Query events for a specific round from the store.
    pub fn store_events_for_round(&self, round: Round) -> SimResult<Vec<EventLogEntry>> {
        self.store.events_for_round(&self.run_id, round)
    }

    /// Final report over everything run so far.
    pub fn report(&self) -> SimReport {
        SimReport {
            run_id:               self.run_id.clone(),
            seed:                 self.seed,
            rounds:               self.next_round,
            final_balance:        self.ledger.balance,
            final_house_revenue:  self.ledger.house_revenue,
            lowest_house_revenue: self.lowest_house_revenue,
            floor_transfers:      self.floor_transfers,
            payout_stats:         self.payouts.summarize(),
            series:               self.series.clone(),
        }
    }

    fn log_entry(&self, round: Round, event: &SimEvent) -> SimResult<EventLogEntry> {
        Ok(EventLogEntry {
            id:         None,
            run_id:     self.run_id.clone(),
            round,
            event_type: event.type_name().to_string(),
            payload:    serde_json::to_string(event)?,
        })
    }
}

//! Run configuration. Loaded once, validated, then immutable.
//!
//! The on-disk document is JSON. It is parsed into `ConfigFile`
//! (raw, with serde defaults) and converted into `LottoConfig`,
//! which carries the accounting toggles as explicit policies.

use crate::{
    error::{SimError, SimResult},
    ticket::Domain,
    types::MatchCount,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Share of the house's cut of each jackpot when no pot skim is configured.
pub const JACKPOT_HOUSE_CUT: f64 = 0.10;

/// Largest ticket batch a single user may ask for in one round.
pub const MAX_TICKETS_PER_USER: u64 = 1_000_000;

/// How the house takes its revenue beyond the ticket-sale share.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HouseTakePolicy {
    /// Skim `pct` of the pot into house revenue before any jackpot is computed.
    PotSkim { pct: f64 },
    /// No skim; the house keeps `JACKPOT_HOUSE_CUT` of every jackpot instead.
    JackpotCut,
}

impl HouseTakePolicy {
    /// The house's share of a jackpot of `amount`.
    pub fn jackpot_cut(&self, amount: f64) -> f64 {
        match self {
            Self::PotSkim { .. } => 0.0,
            Self::JackpotCut => amount * JACKPOT_HOUSE_CUT,
        }
    }
}

/// What happens to pot surplus above the floor at the end of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeftoverPolicy {
    Retain,
    SweepToHouse,
}

/// How fixed incentive amounts respond to round volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IncentiveScaling {
    Fixed,
    /// Incentives grow logarithmically with tickets sold, in steps of
    /// `ticket_count` tickets, and never drop below the ticket price.
    StepUp { ticket_count: u64 },
}

/// The document as written on disk.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    min: i64,
    max: i64,
    n: u32,
    price: f64,
    min_pot: f64,
    rounds: u64,
    min_users: u64,
    max_users: u64,
    min_tickets_per_user: u64,
    max_tickets_per_user: u64,
    #[serde(default)]
    payout_incentives: BTreeMap<MatchCount, f64>,
    #[serde(default)]
    payout_pot_percents: BTreeMap<MatchCount, f64>,
    #[serde(default)]
    house_take_pct: f64,
    #[serde(default)]
    house_takes_leftovers: bool,
    #[serde(default)]
    starting_pot: f64,
    #[serde(default)]
    step_up_ticket_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LottoConfig {
    pub domain: Domain,
    /// Numbers per ticket and per draw.
    pub n: u32,
    pub price: f64,
    pub min_pot: f64,
    pub rounds: u64,
    pub min_users: u64,
    pub max_users: u64,
    pub min_tickets_per_user: u64,
    pub max_tickets_per_user: u64,
    pub payout_incentives: BTreeMap<MatchCount, f64>,
    pub payout_pot_percents: BTreeMap<MatchCount, f64>,
    pub house_take: HouseTakePolicy,
    pub leftovers: LeftoverPolicy,
    pub incentive_scaling: IncentiveScaling,
    pub starting_pot: f64,
}

impl LottoConfig {
    /// Load and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate a JSON config document.
    pub fn from_json(content: &str) -> SimResult<Self> {
        let file: ConfigFile = serde_json::from_str(content)?;
        let config = Self::from(file);
        config.validate()?;
        Ok(config)
    }

    /// Check every invariant the engine relies on.
    /// A config that fails here never runs a single round.
    pub fn validate(&self) -> SimResult<()> {
        if self.domain.min > self.domain.max {
            return Err(SimError::invalid_config(
                "min",
                format!("min {} exceeds max {}", self.domain.min, self.domain.max),
            ));
        }
        if self.n == 0 {
            return Err(SimError::invalid_config("n", "must be at least 1"));
        }
        if u64::from(self.n) > self.domain.size() {
            return Err(SimError::invalid_config(
                "n",
                format!("{} exceeds domain size {}", self.n, self.domain.size()),
            ));
        }
        if self.rounds == 0 {
            return Err(SimError::invalid_config("rounds", "must be positive"));
        }
        if !(self.price.is_finite() && self.price > 0.0) {
            return Err(SimError::invalid_config("price", format!("{} is not positive", self.price)));
        }
        if !(self.min_pot.is_finite() && self.min_pot >= 0.0) {
            return Err(SimError::invalid_config("min_pot", format!("{} is negative", self.min_pot)));
        }
        if !(self.starting_pot.is_finite() && self.starting_pot >= 0.0) {
            return Err(SimError::invalid_config(
                "starting_pot",
                format!("{} is negative", self.starting_pot),
            ));
        }
        if self.min_users > self.max_users {
            return Err(SimError::invalid_config(
                "min_users",
                format!("{} exceeds max_users {}", self.min_users, self.max_users),
            ));
        }
        if self.min_tickets_per_user > self.max_tickets_per_user {
            return Err(SimError::invalid_config(
                "min_tickets_per_user",
                format!(
                    "{} exceeds max_tickets_per_user {}",
                    self.min_tickets_per_user, self.max_tickets_per_user
                ),
            ));
        }
        if self.max_tickets_per_user > MAX_TICKETS_PER_USER {
            return Err(SimError::invalid_config(
                "max_tickets_per_user",
                format!("{} exceeds the limit of {MAX_TICKETS_PER_USER}", self.max_tickets_per_user),
            ));
        }
        for (&k, &amount) in &self.payout_incentives {
            if !(amount.is_finite() && amount >= 0.0) {
                return Err(SimError::invalid_config(
                    "payout_incentives",
                    format!("amount {amount} for {k} matches is negative"),
                ));
            }
        }
        for (&k, &pct) in &self.payout_pot_percents {
            if !(pct > 0.0 && pct <= 1.0) {
                return Err(SimError::invalid_config(
                    "payout_pot_percents",
                    format!("{pct} for {k} matches is outside (0, 1]"),
                ));
            }
        }
        if let HouseTakePolicy::PotSkim { pct } = self.house_take {
            if !(pct > 0.0 && pct <= 1.0) {
                return Err(SimError::invalid_config(
                    "house_take_pct",
                    format!("{pct} is outside [0, 1]"),
                ));
            }
        }
        if let IncentiveScaling::StepUp { ticket_count: 0 } = self.incentive_scaling {
            return Err(SimError::invalid_config("step_up_ticket_count", "must be positive"));
        }

        let unreachable = self
            .payout_incentives
            .keys()
            .chain(self.payout_pot_percents.keys())
            .filter(|&&k| k > self.n);
        for k in unreachable {
            log::warn!("payout tier for {k} matches can never fire with n={}", self.n);
        }
        Ok(())
    }

    /// Small hard-coded config for use in tests.
    pub fn default_test() -> Self {
        Self {
            domain: Domain::new(1, 20),
            n: 4,
            price: 2.0,
            min_pot: 500.0,
            rounds: 50,
            min_users: 50,
            max_users: 150,
            min_tickets_per_user: 1,
            max_tickets_per_user: 5,
            payout_incentives: BTreeMap::from([(2, 1.0), (3, 20.0)]),
            payout_pot_percents: BTreeMap::from([(3, 0.05), (4, 0.5)]),
            house_take: HouseTakePolicy::JackpotCut,
            leftovers: LeftoverPolicy::Retain,
            incentive_scaling: IncentiveScaling::Fixed,
            starting_pot: 0.0,
        }
    }
}

impl From<ConfigFile> for LottoConfig {
    fn from(file: ConfigFile) -> Self {
        let mut payout_incentives = file.payout_incentives;
        // A zero incentive is the same as no incentive.
        payout_incentives.retain(|_, amount| *amount != 0.0);

        // Out-of-range skim percentages are kept as a PotSkim so that
        // validate() can reject them instead of silently disabling the skim.
        let house_take = if file.house_take_pct == 0.0 {
            HouseTakePolicy::JackpotCut
        } else {
            HouseTakePolicy::PotSkim { pct: file.house_take_pct }
        };

        Self {
            domain: Domain::new(file.min, file.max),
            n: file.n,
            price: file.price,
            min_pot: file.min_pot,
            rounds: file.rounds,
            min_users: file.min_users,
            max_users: file.max_users,
            min_tickets_per_user: file.min_tickets_per_user,
            max_tickets_per_user: file.max_tickets_per_user,
            payout_incentives,
            payout_pot_percents: file.payout_pot_percents,
            house_take,
            leftovers: if file.house_takes_leftovers {
                LeftoverPolicy::SweepToHouse
            } else {
                LeftoverPolicy::Retain
            },
            incentive_scaling: match file.step_up_ticket_count {
                Some(ticket_count) => IncentiveScaling::StepUp { ticket_count },
                None => IncentiveScaling::Fixed,
            },
            starting_pot: file.starting_pot,
        }
    }
}

//! End-of-run report: the value handed to summary printers and
//! plotting tools. Nothing in the core formats or renders it.

use crate::{
    stats::{PayoutStats, TimeSeries},
    types::{MatchCount, RunId},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimReport {
    pub run_id: RunId,
    /// The seed that reproduces this run.
    pub seed: u64,
    pub rounds: u64,
    pub final_balance: f64,
    /// Negative when the house has been subsidising the pot floor.
    pub final_house_revenue: f64,
    pub lowest_house_revenue: f64,
    pub floor_transfers: u64,
    pub payout_stats: BTreeMap<MatchCount, PayoutStats>,
    pub series: TimeSeries,
}

impl SimReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

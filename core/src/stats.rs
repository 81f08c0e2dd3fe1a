//! Run-level accumulation: payout samples and per-round time series.

use crate::{round::RoundMetrics, types::MatchCount};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One ticket's total payout in one round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PayoutSample {
    pub match_count: MatchCount,
    pub amount: f64,
}

/// Summary of every nonzero payout for one match count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PayoutStats {
    pub count: u64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Population standard deviation.
    pub std_dev: f64,
}

impl PayoutStats {
    /// `None` for an empty slice.
    pub fn from_amounts(amounts: &[f64]) -> Option<Self> {
        if amounts.is_empty() {
            return None;
        }
        let n = amounts.len() as f64;
        let mean = amounts.iter().sum::<f64>() / n;
        let variance = amounts.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / n;
        Some(Self {
            count: amounts.len() as u64,
            mean,
            min: amounts.iter().copied().fold(f64::INFINITY, f64::min),
            max: amounts.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            std_dev: variance.sqrt(),
        })
    }
}

/// Payout samples for the whole run, grouped by match count.
#[derive(Debug, Clone, Default)]
pub struct PayoutBook {
    amounts: BTreeMap<MatchCount, Vec<f64>>,
}

impl PayoutBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, sample: PayoutSample) {
        self.amounts.entry(sample.match_count).or_default().push(sample.amount);
    }

    pub fn record_all(&mut self, samples: &[PayoutSample]) {
        for sample in samples {
            self.record(*sample);
        }
    }

    pub fn amounts_for(&self, match_count: MatchCount) -> &[f64] {
        self.amounts.get(&match_count).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn summarize(&self) -> BTreeMap<MatchCount, PayoutStats> {
        self.amounts
            .iter()
            .filter_map(|(&k, amounts)| PayoutStats::from_amounts(amounts).map(|s| (k, s)))
            .collect()
    }
}

/// One entry per completed round, in round order. Handed to whatever
/// plots or tabulates the run; nothing here renders it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub balance: Vec<f64>,
    pub payout: Vec<f64>,
    pub house_revenue: Vec<f64>,
    pub users: Vec<u64>,
    pub tickets: Vec<u64>,
}

impl TimeSeries {
    pub fn push(&mut self, metrics: &RoundMetrics) {
        self.balance.push(metrics.balance_after);
        self.payout.push(metrics.payout_total);
        self.house_revenue.push(metrics.house_revenue_after);
        self.users.push(metrics.user_count);
        self.tickets.push(metrics.ticket_count);
    }

    pub fn len(&self) -> usize {
        self.balance.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balance.is_empty()
    }
}

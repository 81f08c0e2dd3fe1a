//! Tickets, the number domain, and the draw.
//!
//! Ticket generation and the winning draw share one sampling
//! procedure: draw uniform values from the domain with replacement
//! and keep them until `k` distinct values have been seen. This
//! degrades as `k` approaches the domain size, and whole-ticket
//! rejection degrades as a user's ticket count approaches the number
//! of distinct combinations, so every batch is clamped to that
//! capacity before sampling starts.

use crate::{
    rng::RandomSource,
    types::{MatchCount, Number},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// The inclusive range of numbers a ticket may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub min: Number,
    pub max: Number,
}

impl Domain {
    pub fn new(min: Number, max: Number) -> Self {
        Self { min, max }
    }

    /// Number of values in the domain; 0 when `min > max`.
    pub fn size(&self) -> u64 {
        if self.min > self.max {
            return 0;
        }
        let span = i128::from(self.max) - i128::from(self.min) + 1;
        u64::try_from(span).unwrap_or(u64::MAX)
    }

    pub fn contains(&self, value: Number) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// One uniform value from the domain.
    pub fn sample<R: RandomSource>(&self, rng: &mut R) -> Number {
        let offset = rng.below(self.size());
        (i128::from(self.min) + i128::from(offset)) as Number
    }
}

/// An unordered set of distinct numbers, stored sorted.
/// The sorted form is the ticket's identity key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticket {
    numbers: Vec<Number>,
}

/// The round's draw has exactly the shape of a ticket.
pub type WinningCombination = Ticket;

impl Ticket {
    /// Build a ticket from any collection of numbers; duplicates collapse.
    pub fn from_numbers(numbers: impl IntoIterator<Item = Number>) -> Self {
        let set: BTreeSet<Number> = numbers.into_iter().collect();
        Self { numbers: set.into_iter().collect() }
    }

    pub fn numbers(&self) -> &[Number] {
        &self.numbers
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    /// Size of the intersection with `other`.
    pub fn match_count(&self, other: &Ticket) -> MatchCount {
        let (mut i, mut j, mut shared) = (0, 0, 0);
        while i < self.numbers.len() && j < other.numbers.len() {
            match self.numbers[i].cmp(&other.numbers[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    shared += 1;
                    i += 1;
                    j += 1;
                }
            }
        }
        shared
    }
}

impl std::fmt::Display for Ticket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.numbers.iter().map(|n| n.to_string()).collect();
        write!(f, "{}", parts.join(":"))
    }
}

/// `C(n, k)`, saturating at `u64::MAX`.
pub fn combinations(n: u64, k: u64) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut acc: u128 = 1;
    for i in 0..k {
        // acc * (n - i) is always divisible by (i + 1) here.
        acc = acc * u128::from(n - i) / u128::from(i + 1);
        if acc > u128::from(u64::MAX) {
            return u64::MAX;
        }
    }
    acc as u64
}

/// Draw `k` distinct values from `domain` by rejection.
///
/// Panics if `k` exceeds the domain size; config validation rules
/// that out before any ticket is generated.
pub fn generate_ticket<R: RandomSource>(domain: &Domain, k: u32, rng: &mut R) -> Ticket {
    assert!(
        u64::from(k) <= domain.size(),
        "cannot draw {k} distinct numbers from a domain of {}",
        domain.size()
    );
    let mut picked = BTreeSet::new();
    while picked.len() < k as usize {
        picked.insert(domain.sample(rng));
    }
    Ticket { numbers: picked.into_iter().collect() }
}

/// Draw the round's winning combination. Same procedure as a ticket.
pub fn draw<R: RandomSource>(domain: &Domain, k: u32, rng: &mut R) -> WinningCombination {
    generate_ticket(domain, k, rng)
}

/// Upper bound on up-front allocation for one user's batch. Wide
/// domains saturate the combination count, so it cannot bound this.
const PREALLOC_LIMIT: u64 = 1024;

/// Generate up to `count` pairwise-distinct tickets for one user,
/// in generation order. `count` is clamped to the number of distinct
/// combinations the domain allows.
pub fn generate_user_batch<R: RandomSource>(
    domain: &Domain,
    k: u32,
    count: u64,
    rng: &mut R,
) -> Vec<Ticket> {
    let capacity = combinations(domain.size(), u64::from(k));
    let target = count.min(capacity);
    if target < count {
        log::debug!("ticket request clamped: requested={count} capacity={capacity}");
    }

    let reserve = target.min(PREALLOC_LIMIT) as usize;
    let mut seen: HashSet<Ticket> = HashSet::with_capacity(reserve);
    let mut batch = Vec::with_capacity(reserve);
    while (batch.len() as u64) < target {
        let ticket = generate_ticket(domain, k, rng);
        if seen.insert(ticket.clone()) {
            batch.push(ticket);
        }
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combinations_matches_known_values() {
        assert_eq!(combinations(10, 3), 120);
        assert_eq!(combinations(5, 5), 1);
        assert_eq!(combinations(5, 0), 1);
        assert_eq!(combinations(3, 4), 0);
        assert_eq!(combinations(49, 6), 13_983_816);
    }

    #[test]
    fn combinations_saturates() {
        assert_eq!(combinations(u64::MAX, 10), u64::MAX);
    }

    #[test]
    fn domain_size_handles_wide_ranges() {
        assert_eq!(Domain::new(1, 10).size(), 10);
        assert_eq!(Domain::new(-5, 5).size(), 11);
        assert_eq!(Domain::new(3, 2).size(), 0);
        assert_eq!(Domain::new(i64::MIN, i64::MAX).size(), u64::MAX);
    }

    #[test]
    fn display_uses_colon_joined_key() {
        assert_eq!(Ticket::from_numbers([3, 1, 2]).to_string(), "1:2:3");
    }

    #[test]
    fn duplicates_collapse_and_empty_input_is_empty() {
        let t = Ticket::from_numbers([5, 5, 2]);
        assert_eq!(t.numbers(), &[2, 5]);
        assert!(!t.is_empty());
        assert!(Ticket::from_numbers(Vec::new()).is_empty());
    }
}

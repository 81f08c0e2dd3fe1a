//! Multi-round economics simulator for a parimutuel-style number lottery.
//!
//! Players buy unique number combinations, one combination is drawn per
//! round, winners are paid from a shared pot, and the house takes revenue
//! under configurable rules while a pot floor keeps the game solvent.
//! The output is a reproducible trajectory of pot, payouts, house revenue
//! and player count for tuning game parameters.

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod ledger;
pub mod payout;
pub mod population;
pub mod report;
pub mod rng;
pub mod round;
pub mod stats;
pub mod store;
pub mod ticket;
pub mod types;

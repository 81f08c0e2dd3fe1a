//! SQLite persistence layer for the run log.
//!
//! RULE: Only store.rs talks to the database.
//! The engine calls store methods, it never executes SQL directly.
//!
//! The store lives for one process run. It is in-memory unless the
//! caller opens a file, in which case the file is an export only:
//! nothing ever resumes a run from it.

use crate::{
    error::SimResult,
    event::EventLogEntry,
    round::RoundMetrics,
    types::Round,
};
use rusqlite::{params, Connection};

pub struct SimStore {
    conn: Connection,
}

impl SimStore {
    /// Open (or create) the run database at `path`.
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database.
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn.execute_batch(include_str!("../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(&self, run_id: &str, seed: u64, version: &str, started_at: &str) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, seed, version, started_at) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, seed as i64, version, started_at],
        )?;
        Ok(())
    }

    pub fn run_seed(&self, run_id: &str) -> SimResult<Option<u64>> {
        let mut stmt = self.conn.prepare("SELECT seed FROM run WHERE run_id = ?1")?;
        let mut rows = stmt.query(params![run_id])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get::<_, i64>(0)? as u64)),
            None => Ok(None),
        }
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (run_id, round, event_type, payload)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.run_id,
                entry.round as i64,
                entry.event_type,
                entry.payload,
            ],
        )?;
        Ok(())
    }

    pub fn events_for_round(&self, run_id: &str, round: Round) -> SimResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, round, event_type, payload
             FROM event_log WHERE run_id = ?1 AND round = ?2
             ORDER BY id ASC"
        )?;
        let entries = stmt.query_map(params![run_id, round as i64], |row| {
            Ok(EventLogEntry {
                id:         Some(row.get(0)?),
                run_id:     row.get(1)?,
                round:      row.get::<_, i64>(2)? as u64,
                event_type: row.get(3)?,
                payload:    row.get(4)?,
            })
        })?.collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn event_count(&self, run_id: &str, event_type: &str) -> SimResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE run_id = ?1 AND event_type = ?2",
            params![run_id, event_type],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ── Round metrics ──────────────────────────────────────────

    /// Write one round's events and metrics atomically. On error
    /// nothing from the round is left in the log.
    pub fn save_round(&self, run_id: &str, events: &[EventLogEntry], metrics: &RoundMetrics) -> SimResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        for entry in events {
            self.append_event(entry)?;
        }
        self.save_round_metrics(run_id, metrics)?;
        tx.commit()?;
        Ok(())
    }

    pub fn save_round_metrics(&self, run_id: &str, metrics: &RoundMetrics) -> SimResult<()> {
        let histogram_json = serde_json::to_string(&metrics.match_count_histogram)?;
        self.conn.execute(
            "INSERT INTO round_metrics (
                run_id, round, user_count, ticket_count, payout_total,
                jackpot_house_cut, balance_after, house_revenue_after, histogram_json
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                run_id,
                metrics.round as i64,
                metrics.user_count as i64,
                metrics.ticket_count as i64,
                metrics.payout_total,
                metrics.jackpot_house_cut,
                metrics.balance_after,
                metrics.house_revenue_after,
                histogram_json,
            ],
        )?;
        Ok(())
    }

    pub fn all_round_metrics(&self, run_id: &str) -> SimResult<Vec<RoundMetrics>> {
        let mut stmt = self.conn.prepare(
            "SELECT round, user_count, ticket_count, payout_total, jackpot_house_cut,
                    balance_after, house_revenue_after, histogram_json
             FROM round_metrics WHERE run_id = ?1
             ORDER BY round ASC"
        )?;
        let rows = stmt.query_map(params![run_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, f64>(5)?,
                row.get::<_, f64>(6)?,
                row.get::<_, String>(7)?,
            ))
        })?.collect::<Result<Vec<_>, _>>()?;

        let mut metrics = Vec::with_capacity(rows.len());
        for (round, users, tickets, payout, cut, balance, house, histogram_json) in rows {
            metrics.push(RoundMetrics {
                round:                 round as u64,
                user_count:            users as u64,
                ticket_count:          tickets as u64,
                payout_total:          payout,
                jackpot_house_cut:     cut,
                balance_after:         balance,
                house_revenue_after:   house,
                match_count_histogram: serde_json::from_str(&histogram_json)?,
            });
        }
        Ok(metrics)
    }
}

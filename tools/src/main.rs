//! lotto-runner: headless runner for the lottery economics simulator.
//!
//! Usage:
//!   lotto-runner --config game.json
//!   lotto-runner --config game.json --seed 12345 --rounds 500
//!   lotto-runner --config game.json --db run.db --report report.json

use anyhow::{Context, Result};
use lotto_core::{
    config::LottoConfig,
    engine::SimEngine,
    report::SimReport,
    rng::fresh_seed,
    store::SimStore,
};
use std::env;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let config_path = flag_value(&args, "--config")
        .context("missing --config <path to JSON game config>")?;
    let db = flag_value(&args, "--db").unwrap_or(":memory:");
    let report_path = flag_value(&args, "--report");

    let mut config = LottoConfig::load(config_path)
        .with_context(|| format!("cannot load config {config_path}"))?;
    if let Some(rounds) = parse_flag::<u64>(&args, "--rounds")? {
        config.rounds = rounds;
    }

    let seed = match parse_flag::<u64>(&args, "--seed")? {
        Some(seed) => seed,
        None => fresh_seed(),
    };

    println!("Lotto economics: lotto-runner");
    println!("  config:    {config_path}");
    println!("  seed:      {seed}");
    println!("  rounds:    {}", config.rounds);
    println!("  db:        {db}");
    println!();

    let store = if db == ":memory:" {
        SimStore::in_memory()?
    } else {
        SimStore::open(db)?
    };
    store.migrate()?;

    let run_id = format!("run-{seed}-{}", uuid::Uuid::new_v4().simple());
    let started_at = chrono::Utc::now().to_rfc3339();
    store.insert_run(&run_id, seed, env!("CARGO_PKG_VERSION"), &started_at)?;

    let mut engine = SimEngine::new(run_id, seed, config, store)?;
    engine.run()?;

    let report = engine.report();
    print_summary(&engine, &report);

    if let Some(path) = report_path {
        std::fs::write(path, report.to_json()?)
            .with_context(|| format!("cannot write report {path}"))?;
        log::info!("Report written to {path}");
    }

    Ok(())
}

fn print_summary(engine: &SimEngine, report: &SimReport) {
    let n = engine.config().n;

    println!();
    println!("=== RUN SUMMARY ===");
    println!("  run_id:          {}", report.run_id);
    println!("  seed:            {}", report.seed);
    println!("  rounds run:      {}", report.rounds);
    println!("  final pot:       {:.2}", report.final_balance);
    println!("  house revenue:   {:.2}", report.final_house_revenue);
    println!("  lowest house:    {:.2}", report.lowest_house_revenue);
    println!("  floor transfers: {}", report.floor_transfers);
    if report.final_house_revenue < 0.0 {
        println!("  WARNING: house revenue is negative; the pot floor is underfunded");
    }

    println!();
    println!("=== PAYOUTS BY MATCH COUNT ===");
    if report.payout_stats.is_empty() {
        println!("  (No payouts made)");
    }
    for (matches, stats) in &report.payout_stats {
        println!(
            "  {matches}/{n} matches | n: {} | mean: {:.2} | min: {:.2} | max: {:.2} | std: {:.2}",
            stats.count, stats.mean, stats.min, stats.max, stats.std_dev
        );
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_flag<T>(args: &[String], flag: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    flag_value(args, flag)
        .map(|v| v.parse::<T>().with_context(|| format!("invalid value for {flag}: {v}")))
        .transpose()
}

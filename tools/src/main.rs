//! loan-scorer: batch runner for the loan fraud-risk pipeline.
//!
//! Usage:
//!   loan-scorer --applications apps.csv --transactions txns.csv --bundle model.json [--db scores.db]
//!   loan-scorer --applications apps.csv --transactions txns.csv --features-out features.csv
//!   loan-scorer --generate 200 --seed 42 --out ./demo

use anyhow::{bail, Result};
use loanrisk_core::{
    assembly::FeaturePipeline,
    config::PipelineConfig,
    loader::{load_applications, load_transactions, write_applications, write_feature_table, write_transactions},
    model::ModelContext,
    scoring::{LoanScorer, ScoreOutcome},
    store::ScoreStore,
    synth::{generate, SyntheticConfig},
};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if let Some(customers) = arg_value(&args, "--generate") {
        let customers: usize = customers.parse()?;
        let seed = parse_arg(&args, "--seed", 42u64);
        let out = arg_value(&args, "--out").unwrap_or(".");
        return run_generate(customers, seed, out);
    }

    let Some(applications_path) = arg_value(&args, "--applications") else {
        bail!("--applications <csv> is required");
    };
    // Scoring without transaction history is refused before anything runs.
    let Some(transactions_path) = arg_value(&args, "--transactions") else {
        bail!("--transactions <csv> is required: upload the customer's transaction history");
    };

    let mut config = match arg_value(&args, "--data-dir") {
        Some(dir) => PipelineConfig::load(dir)?,
        None => PipelineConfig::default(),
    };
    if args.iter().any(|a| a == "--parallel") {
        config = config.with_parallel(true);
    }

    let applications = load_applications(applications_path)?;
    let transactions = load_transactions(transactions_path)?;
    log::info!(
        "loan-scorer: windows {:?}, parallel={}, {} applications, {} transactions",
        config.windows,
        config.parallel,
        applications.len(),
        transactions.len()
    );

    if let Some(features_out) = arg_value(&args, "--features-out") {
        let pipeline = FeaturePipeline::new(&config)?;
        let table = pipeline.model_inputs(&applications, &transactions)?;
        write_feature_table(features_out, &table)?;
        println!("wrote {} rows x {} columns to {features_out}", table.len(), table.width());
        return Ok(());
    }

    let Some(bundle_path) = arg_value(&args, "--bundle") else {
        bail!("--bundle <json> is required for scoring (or pass --features-out)");
    };
    let context = ModelContext::load(bundle_path)?;
    let scorer = LoanScorer::new(&context, &config)?;
    let outcomes = scorer.score(&applications, &transactions)?;

    let db = arg_value(&args, "--db").unwrap_or(":memory:");
    let mut store = ScoreStore::open(db)?;
    store.migrate()?;
    let batch_id = store.begin_batch(applications_path, applications.len())?;
    store.record_outcomes(&batch_id, &outcomes)?;

    for outcome in &outcomes {
        println!("{}", serde_json::to_string(outcome)?);
    }
    print_summary(&batch_id, db, &outcomes);
    Ok(())
}

fn run_generate(customers: usize, seed: u64, out: &str) -> Result<()> {
    std::fs::create_dir_all(out)?;
    let config = SyntheticConfig {
        customers,
        ..SyntheticConfig::default()
    };
    let dataset = generate(seed, &config);

    let apps_path = format!("{out}/loan_applications.csv");
    let txns_path = format!("{out}/transactions.csv");
    write_applications(&apps_path, &dataset.applications)?;
    write_transactions(&txns_path, &dataset.transactions)?;

    let config_path = format!("{out}/pipeline.json");
    std::fs::write(&config_path, serde_json::to_string_pretty(&PipelineConfig::default())?)?;

    println!("loan-scorer: synthetic dataset");
    println!("  seed:          {seed}");
    println!("  customers:     {customers}");
    println!("  applications:  {} -> {apps_path}", dataset.applications.len());
    println!("  transactions:  {} -> {txns_path}", dataset.transactions.len());
    println!("  config:        {config_path}");
    Ok(())
}

fn print_summary(batch_id: &str, db: &str, outcomes: &[ScoreOutcome]) {
    let flagged = outcomes.iter().filter(|o| o.fraud_flag).count();
    let clean: Vec<f64> = outcomes
        .iter()
        .filter_map(|o| o.credit.map(|c| c.score))
        .collect();
    let avg_credit = if clean.is_empty() {
        0.0
    } else {
        clean.iter().sum::<f64>() / clean.len() as f64
    };

    eprintln!("=== SCORING SUMMARY ===");
    eprintln!("  batch_id:      {batch_id}");
    eprintln!("  db:            {db}");
    eprintln!("  applications:  {}", outcomes.len());
    eprintln!("  flagged:       {flagged}");
    eprintln!("  clean:         {}", clean.len());
    eprintln!("  avg credit:    {avg_credit:.1}");
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

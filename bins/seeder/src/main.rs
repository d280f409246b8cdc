//! Budget seeder for development and demos.
//!
//! Writes a template-seeded budget year into the configured document store
//! for every year given on the command line (default: the current and next
//! year). Years that already have a document are skipped.
//!
//! Usage: cargo run --bin seeder -- 2025 2026

use std::sync::Arc;

use anyhow::Context;
use chrono::{Datelike, Utc};
use desa_core::budget::YearKey;
use desa_core::privilege::StaticPrivilege;
use desa_shared::AppConfig;
use desa_store::{BudgetStore, document};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "desa=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let backend = document::from_config(&config.store)?;

    let years = requested_years()?;
    let mut store = BudgetStore::new(Arc::clone(&backend));
    store.load().await?;

    // The seeder is an operator tool; it does not go through the admin token.
    let gate = StaticPrivilege(true);
    for year in &years {
        if backend.get(year.as_str()).await?.is_some() {
            info!(year = %year, "budget year already exists, skipping");
            continue;
        }
        store.edit(|tree| {
            tree.ensure_year(year);
            Ok::<_, anyhow::Error>(())
        })?;
        store.save_year(&gate, year).await?;
        info!(year = %year, "budget year seeded");
    }

    info!(years = years.len(), "seeding complete");
    Ok(())
}

/// Years from the command line, or the current and next calendar year.
fn requested_years() -> anyhow::Result<Vec<YearKey>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        let current = current_year();
        return Ok(vec![
            YearKey::parse(&current.to_string())?,
            YearKey::parse(&(current + 1).to_string())?,
        ]);
    }
    args.iter()
        .map(|raw| YearKey::parse(raw).with_context(|| format!("invalid year {raw:?}")))
        .collect()
}

fn current_year() -> i32 {
    Utc::now().year()
}

//! Market data commands: import-csv, update-quotes.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use kto_ledger::SharedStore;
use kto_quotes::import::{read_csv_file, rows_to_entries};
use kto_quotes::FileQuoteService;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{date_or_today, AppContext};

pub fn import_csv(ctx: &AppContext, path: &Path, delimiter: char, dry_run: bool) -> Result<()> {
    if !delimiter.is_ascii() {
        anyhow::bail!("delimiter must be a single ASCII character, got {delimiter:?}");
    }
    let mut store = ctx.open_store()?;

    let rows = read_csv_file(path, delimiter as u8)
        .with_context(|| format!("read {}", path.display()))?;
    let entries = rows_to_entries(&store, &rows)?;

    if dry_run {
        for e in &entries {
            println!(
                "date={} type={} key={} quantity={} price={} value={}",
                e.date(),
                e.entry_type,
                e.group_key(),
                e.quantity_micros,
                e.price_micros,
                e.value_micros
            );
        }
        println!("dry_run=true rows={}", entries.len());
        return Ok(());
    }

    // Nothing is written unless every row is accepted.
    for (row, e) in rows.iter().zip(entries) {
        store
            .add(e)
            .with_context(|| format!("row {}: {}", row.row, row.wkn))?;
    }
    ctx.save_store(&store)?;
    println!("imported={}", rows.len());
    Ok(())
}

pub async fn update_quotes(
    ctx: &AppContext,
    file: Option<PathBuf>,
    date: Option<NaiveDate>,
) -> Result<()> {
    let Some(file) = file.or_else(|| ctx.config.quotes.file.clone()) else {
        anyhow::bail!("no quote source: pass --file or set quotes.file in config");
    };
    if let Some(loaded) = &ctx.loaded {
        let secrets = kto_config::resolve_quote_api_key(&loaded.config_json);
        debug!(?secrets, "quote credentials resolved");
    }

    let date = date_or_today(date);
    let shared = SharedStore::new(ctx.open_store()?);
    let service = FileQuoteService::new(file);

    let update = kto_quotes::update_quotes(&shared, &service, date)
        .await
        .with_context(|| format!("update quotes from {}", service.path().display()))?;
    shared
        .save(&ctx.ledger_path)
        .with_context(|| format!("save ledger {}", ctx.ledger_path.display()))?;

    println!(
        "added={} rejected={} failed_requests={}",
        update.added.len(),
        update.rejected,
        update.failed_requests
    );
    Ok(())
}

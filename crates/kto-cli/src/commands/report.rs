//! Read-only reports: entries, positions, rate, yield.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use kto_ledger::{internal_rate_of_return, total_earnings_at_maturity, LedgerEntry};
use kto_query::{MacroTable, Query};

use super::{date_or_today, AppContext};

pub fn entries(ctx: &AppContext, query: &str) -> Result<()> {
    let store = ctx.open_store()?;

    let mut macros = MacroTable::default();
    macros.extend(ctx.config.query.macros.iter().map(|(k, v)| (k, v.clone())));
    let query = Query::parse(query, &macros).with_context(|| format!("invalid query {query:?}"))?;

    let rows = kto_query::search(&store, &query);
    for row in &rows {
        let label = row.asset.map(|a| a.label()).unwrap_or("");
        println!("{}", entry_line(row.entry, label));
    }
    println!("count={}", rows.len());
    Ok(())
}

fn entry_line(e: &LedgerEntry, label: &str) -> String {
    let mut line = format!(
        "seq={} date={} type={} key={}",
        e.sequence_num,
        e.date(),
        e.entry_type,
        e.group_key()
    );
    if !label.is_empty() {
        line.push_str(&format!(" label={label:?}"));
    }
    for (name, m) in [
        ("quantity", e.quantity_micros),
        ("price", e.price_micros),
        ("value", e.value_micros),
        ("cost", e.cost_micros),
    ] {
        if !m.is_zero() {
            line.push_str(&format!(" {name}={m}"));
        }
    }
    if !e.currency.is_empty() {
        line.push_str(&format!(" currency={}", e.currency));
    }
    if !e.comment.is_empty() {
        line.push_str(&format!(" comment={:?}", e.comment));
    }
    line
}

pub fn positions(ctx: &AppContext, date: Option<NaiveDate>) -> Result<()> {
    let store = ctx.open_store()?;
    let date = date_or_today(date);

    for p in store.positions_at(date)? {
        println!(
            "id={} label={:?} currency={} quantity={} price={} market_value={} purchase_price={} profit_loss={}",
            p.asset.id(),
            p.asset.label(),
            p.asset.currency,
            p.quantity_micros,
            p.price_micros,
            p.market_value(),
            p.purchase_price(),
            p.profit_loss()
        );
    }

    let total = store.total_market_value(date)?;
    println!(
        "date={} total_{}={}",
        date,
        store.base_currency().to_ascii_lowercase(),
        total.total_micros.format(".2")
    );
    if !total.missing_rates.is_empty() {
        println!("missing_rates={}", total.missing_rates.join(","));
    }
    Ok(())
}

pub fn rate(ctx: &AppContext, currency: &str, date: Option<NaiveDate>) -> Result<()> {
    let store = ctx.open_store()?;
    let date = date_or_today(date);
    let currency = currency.to_ascii_uppercase();

    let (rate, as_of) = store.rate_at(&currency, date)?;
    println!(
        "pair={}/{} rate={} as_of={}",
        store.base_currency(),
        currency,
        rate,
        as_of
    );
    Ok(())
}

pub fn yields(ctx: &AppContext, asset_ref: &str, date: Option<NaiveDate>) -> Result<()> {
    let store = ctx.open_store()?;
    let date = date_or_today(date);

    let asset = store.find_asset(asset_ref)?;
    let pos = store.position_at(asset.id(), date)?;
    let Some(maturity) = asset.maturity_date else {
        anyhow::bail!("asset {} has no maturity date", asset.id());
    };

    println!("id={} maturity_date={}", asset.id(), maturity);
    println!("earnings_at_maturity={}", total_earnings_at_maturity(&pos).format(".2"));
    println!("irr={:.6}", internal_rate_of_return(&pos));
    Ok(())
}

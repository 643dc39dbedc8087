//! Ledger mutation commands: init, add-asset, add, delete.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use kto_ledger::{
    Asset, AssetType, EntryType, InterestPaymentSchedule, LedgerEntry, Micros, Store,
};

use super::{date_or_today, AppContext};

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

pub fn init(ctx: &AppContext, base_currency: Option<String>, force: bool) -> Result<()> {
    if ctx.ledger_path.exists() && !force {
        anyhow::bail!(
            "REFUSING INIT: {} already exists. Re-run with: `kto init --force`",
            ctx.ledger_path.display()
        );
    }
    let base = base_currency.unwrap_or_else(|| ctx.config.ledger.base_currency.clone());
    let store = Store::new(&base.to_ascii_uppercase())
        .with_context(|| format!("invalid base currency {base:?}"))?;
    ctx.save_store(&store)?;
    println!("ledger={}", ctx.ledger_path.display());
    println!("base_currency={}", store.base_currency());
    Ok(())
}

// ---------------------------------------------------------------------------
// add-asset
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddAssetArgs {
    /// Asset type, e.g. Stock, GovernmentBond, CheckingAccount
    #[arg(long = "type", value_parser = parse_asset_type)]
    pub asset_type: AssetType,

    #[arg(long)]
    pub name: String,

    /// Defaults to the ledger's base currency
    #[arg(long)]
    pub currency: Option<String>,

    #[arg(long)]
    pub short_name: Option<String>,

    #[arg(long)]
    pub isin: Option<String>,

    #[arg(long)]
    pub wkn: Option<String>,

    #[arg(long)]
    pub ticker: Option<String>,

    /// Symbol requested from the quote service, if different from the ticker
    #[arg(long)]
    pub quote_symbol: Option<String>,

    #[arg(long)]
    pub iban: Option<String>,

    #[arg(long)]
    pub account_number: Option<String>,

    #[arg(long)]
    pub custom_id: Option<String>,

    #[arg(long)]
    pub issue_date: Option<NaiveDate>,

    #[arg(long)]
    pub maturity_date: Option<NaiveDate>,

    /// Nominal interest rate as a fraction (0.04 = 4%)
    #[arg(long)]
    pub interest: Option<Micros>,

    /// accrued | annual
    #[arg(long, value_parser = parse_interest_schedule)]
    pub interest_payment: Option<InterestPaymentSchedule>,

    #[arg(long)]
    pub comment: Option<String>,
}

pub fn add_asset(ctx: &AppContext, args: AddAssetArgs) -> Result<()> {
    let mut store = ctx.open_store()?;

    let currency = args
        .currency
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or_else(|| store.base_currency().to_string());
    let mut asset = Asset::new(args.asset_type, args.name, currency);
    asset.short_name = args.short_name.unwrap_or_default();
    asset.isin = args.isin.unwrap_or_default();
    asset.wkn = args.wkn.unwrap_or_default();
    asset.ticker_symbol = args.ticker.unwrap_or_default();
    asset.quote_service_symbol = args.quote_symbol.unwrap_or_default();
    asset.iban = args.iban.unwrap_or_default();
    asset.account_number = args.account_number.unwrap_or_default();
    asset.custom_id = args.custom_id.unwrap_or_default();
    asset.issue_date = args.issue_date;
    asset.maturity_date = args.maturity_date;
    asset.interest_micros = args.interest.unwrap_or(Micros::ZERO);
    asset.interest_payment_schedule = args.interest_payment.unwrap_or_default();
    asset.comment = args.comment.unwrap_or_default();

    let id = asset.id().to_string();
    store.add_asset(asset).context("add asset")?;
    ctx.save_store(&store)?;
    println!("asset_id={id}");
    Ok(())
}

fn parse_asset_type(s: &str) -> Result<AssetType, String> {
    AssetType::parse(s).ok_or_else(|| {
        let names: Vec<&str> = AssetType::all().map(AssetType::as_str).collect();
        format!("unknown asset type '{s}'. expected one of: {}", names.join(" | "))
    })
}

fn parse_interest_schedule(s: &str) -> Result<InterestPaymentSchedule, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "accrued" => Ok(InterestPaymentSchedule::Accrued),
        "annual" => Ok(InterestPaymentSchedule::Annual),
        other => Err(format!("invalid interest payment '{other}'. expected: accrued | annual")),
    }
}

// ---------------------------------------------------------------------------
// add
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddEntryArgs {
    /// Entry type, e.g. AssetPurchase, AccountCredit, ExchangeRate
    #[arg(long = "type", value_parser = parse_entry_type)]
    pub entry_type: EntryType,

    /// Asset id or any unique part of its name/identifiers
    #[arg(long)]
    pub asset: Option<String>,

    /// Value date (default: today)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    #[arg(long)]
    pub quantity: Option<Micros>,

    #[arg(long)]
    pub price: Option<Micros>,

    #[arg(long)]
    pub value: Option<Micros>,

    #[arg(long)]
    pub cost: Option<Micros>,

    #[arg(long)]
    pub currency: Option<String>,

    /// Quote currency of an ExchangeRate entry
    #[arg(long)]
    pub quote_currency: Option<String>,

    #[arg(long)]
    pub comment: Option<String>,
}

pub fn add_entry(ctx: &AppContext, args: AddEntryArgs) -> Result<()> {
    let mut store = ctx.open_store()?;

    let mut e = LedgerEntry::new(args.entry_type, date_or_today(args.date));
    e.asset_ref = args.asset.unwrap_or_default();
    e.quantity_micros = args.quantity.unwrap_or(Micros::ZERO);
    e.price_micros = args.price.unwrap_or(Micros::ZERO);
    e.value_micros = args.value.unwrap_or(Micros::ZERO);
    e.cost_micros = args.cost.unwrap_or(Micros::ZERO);
    e.currency = args.currency.map(|c| c.to_ascii_uppercase()).unwrap_or_default();
    e.quote_currency = args
        .quote_currency
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or_default();
    e.comment = args.comment.unwrap_or_default();

    let seq = store.add(e).context("add entry")?;
    ctx.save_store(&store)?;
    println!("sequence_num={seq}");
    Ok(())
}

fn parse_entry_type(s: &str) -> Result<EntryType, String> {
    EntryType::parse(s).ok_or_else(|| {
        let names: Vec<&str> = EntryType::ALL.iter().map(|t| t.as_str()).collect();
        format!("unknown entry type '{s}'. expected one of: {}", names.join(" | "))
    })
}

// ---------------------------------------------------------------------------
// delete
// ---------------------------------------------------------------------------

pub fn delete(ctx: &AppContext, sequence_num: i64) -> Result<()> {
    let mut store = ctx.open_store()?;
    let removed = store
        .delete(sequence_num)
        .with_context(|| format!("delete entry {sequence_num}"))?;
    ctx.save_store(&store)?;
    println!(
        "deleted=true sequence_num={} type={} key={}",
        removed.sequence_num,
        removed.entry_type,
        removed.group_key()
    );
    Ok(())
}

//! Static asset-type registry.
//!
//! Every [`AssetType`] maps to one immutable [`AssetTypeInfo`] row: display
//! name, [`Category`] and the entry types an asset of that type accepts.
//! The table is a `static`; lookup is a pure function of the variant.

use serde::{Deserialize, Serialize};

use crate::model::EntryType;

/// Kind of asset tracked by the ledger.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AssetType {
    Stock,
    StockExchangeTradedFund,
    StockMutualFund,
    BondExchangeTradedFund,
    BondMutualFund,
    CorporateBond,
    GovernmentBond,
    FixedDepositAccount,
    MoneyMarketAccount,
    SavingsAccount,
    CheckingAccount,
    BrokerageAccount,
    PensionAccount,
    Commodity,
    Cash,
    TaxLiability,
    TaxPayment,
    CreditCardDebt,
    OtherDebt,
}

/// Reporting category of an asset type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Equity,
    FixedIncome,
    CashEquivalents,
    Retirement,
    Commodities,
    Taxes,
    Debt,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Equity => "Equity",
            Category::FixedIncome => "FixedIncome",
            Category::CashEquivalents => "CashEquivalents",
            Category::Retirement => "Retirement",
            Category::Commodities => "Commodities",
            Category::Taxes => "Taxes",
            Category::Debt => "Debt",
        }
    }
}

/// One registry row.
#[derive(Debug)]
pub struct AssetTypeInfo {
    pub asset_type: AssetType,
    pub name: &'static str,
    pub display_name: &'static str,
    pub category: Category,
    pub valid_entry_types: &'static [EntryType],
}

impl AssetTypeInfo {
    pub fn accepts(&self, t: EntryType) -> bool {
        self.valid_entry_types.contains(&t)
    }

    /// Account-like assets are valued by their balance, not quantity × price.
    pub fn is_account(&self) -> bool {
        self.accepts(EntryType::AccountBalance)
    }
}

use EntryType::*;

const EQUITY_ENTRIES: &[EntryType] = &[
    AssetPurchase,
    AssetSale,
    AssetHolding,
    AssetPrice,
    DividendPayment,
];
const BOND_FUND_ENTRIES: &[EntryType] = &[
    AssetPurchase,
    AssetSale,
    AssetHolding,
    AssetPrice,
    DividendPayment,
    InterestPayment,
];
const BOND_ENTRIES: &[EntryType] = &[
    AssetPurchase,
    AssetSale,
    AssetHolding,
    AssetPrice,
    AssetMaturity,
    InterestPayment,
];
const DEPOSIT_ENTRIES: &[EntryType] = &[
    AccountCredit,
    AccountDebit,
    AccountBalance,
    AssetMaturity,
    InterestPayment,
];
const ACCOUNT_ENTRIES: &[EntryType] = &[
    AccountCredit,
    AccountDebit,
    AccountBalance,
    InterestPayment,
];
const COMMODITY_ENTRIES: &[EntryType] = &[AssetPurchase, AssetSale, AssetHolding, AssetPrice];
const LIABILITY_ENTRIES: &[EntryType] = &[AccountCredit, AccountDebit, AccountBalance];

macro_rules! row {
    ($t:ident, $display:expr, $cat:ident, $entries:expr) => {
        AssetTypeInfo {
            asset_type: AssetType::$t,
            name: stringify!($t),
            display_name: $display,
            category: Category::$cat,
            valid_entry_types: $entries,
        }
    };
}

static ASSET_TYPES: [AssetTypeInfo; 19] = [
    row!(Stock, "Stock", Equity, EQUITY_ENTRIES),
    row!(StockExchangeTradedFund, "Stock ETF", Equity, EQUITY_ENTRIES),
    row!(StockMutualFund, "Stock Mutual Fund", Equity, EQUITY_ENTRIES),
    row!(BondExchangeTradedFund, "Bond ETF", FixedIncome, BOND_FUND_ENTRIES),
    row!(BondMutualFund, "Bond Mutual Fund", FixedIncome, BOND_FUND_ENTRIES),
    row!(CorporateBond, "Corporate Bond", FixedIncome, BOND_ENTRIES),
    row!(GovernmentBond, "Government Bond", FixedIncome, BOND_ENTRIES),
    row!(FixedDepositAccount, "Fixed Deposit", FixedIncome, DEPOSIT_ENTRIES),
    row!(MoneyMarketAccount, "Money Market", CashEquivalents, ACCOUNT_ENTRIES),
    row!(SavingsAccount, "Savings Account", CashEquivalents, ACCOUNT_ENTRIES),
    row!(CheckingAccount, "Checking Account", CashEquivalents, ACCOUNT_ENTRIES),
    row!(BrokerageAccount, "Brokerage Account", CashEquivalents, ACCOUNT_ENTRIES),
    row!(PensionAccount, "Pension Account", Retirement, ACCOUNT_ENTRIES),
    row!(Commodity, "Commodity", Commodities, COMMODITY_ENTRIES),
    row!(Cash, "Cash", CashEquivalents, ACCOUNT_ENTRIES),
    row!(TaxLiability, "Tax Liability", Taxes, LIABILITY_ENTRIES),
    row!(TaxPayment, "Tax Payment", Taxes, LIABILITY_ENTRIES),
    row!(CreditCardDebt, "Credit Card Debt", Debt, LIABILITY_ENTRIES),
    row!(OtherDebt, "Other Debt", Debt, LIABILITY_ENTRIES),
];

impl AssetType {
    /// The registry row for this type.
    pub fn info(self) -> &'static AssetTypeInfo {
        // Rows are declared in variant order.
        &ASSET_TYPES[self as usize]
    }

    pub fn category(self) -> Category {
        self.info().category
    }

    pub fn as_str(self) -> &'static str {
        self.info().name
    }

    pub fn all() -> impl Iterator<Item = AssetType> {
        ASSET_TYPES.iter().map(|i| i.asset_type)
    }

    /// Parse a type name as written in the ledger (`"GovernmentBond"`),
    /// case-insensitively.
    pub fn parse(s: &str) -> Option<AssetType> {
        ASSET_TYPES
            .iter()
            .find(|i| i.name.eq_ignore_ascii_case(s.trim()))
            .map(|i| i.asset_type)
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

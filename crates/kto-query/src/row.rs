use std::cmp::Ordering;

use kto_ledger::{Asset, LedgerEntry, Micros};

use crate::error::QueryError;

/// An entry together with the asset it references (none for exchange rates).
#[derive(Clone, Copy, Debug)]
pub struct Row<'a> {
    pub entry: &'a LedgerEntry,
    pub asset: Option<&'a Asset>,
}

impl<'a> Row<'a> {
    pub fn new(entry: &'a LedgerEntry, asset: Option<&'a Asset>) -> Self {
        Row { entry, asset }
    }

    /// Non-empty values of `field`. An empty result means the row has no
    /// value for it.
    pub(crate) fn values(&self, field: Field) -> Vec<&'a str> {
        let e = self.entry;
        let a = self.asset;
        let mut out: Vec<&'a str> = match field {
            Field::Id => vec![e.asset_id.as_str()],
            Field::Type => vec![e.entry_type.as_str()],
            Field::Comment => vec![e.comment.as_str()],
            Field::Currency => {
                let own = if e.currency.is_empty() {
                    a.map(|a| a.currency.as_str()).unwrap_or("")
                } else {
                    e.currency.as_str()
                };
                vec![own, e.quote_currency.as_str()]
            }
            Field::Name => a.map(|a| a.name.as_str()).into_iter().collect(),
            Field::Label => a.map(|a| a.label()).into_iter().collect(),
            Field::Class => a.map(|a| a.asset_type.as_str()).into_iter().collect(),
            Field::Category => a.map(|a| a.asset_type.category().as_str()).into_iter().collect(),
            Field::Isin => a.map(|a| a.isin.as_str()).into_iter().collect(),
            Field::Wkn => a.map(|a| a.wkn.as_str()).into_iter().collect(),
            Field::Ticker => a.map(|a| a.ticker_symbol.as_str()).into_iter().collect(),
            Field::Iban => a.map(|a| a.iban.as_str()).into_iter().collect(),
        };
        out.retain(|s| !s.is_empty());
        out
    }

    /// Values searched by a bare term.
    pub(crate) fn default_values(&self) -> Vec<&'a str> {
        DEFAULT_FIELDS.iter().flat_map(|f| self.values(*f)).collect()
    }
}

/// Filterable fields.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Field {
    Id,
    Name,
    Label,
    Type,
    Class,
    Category,
    Currency,
    Comment,
    Isin,
    Wkn,
    Ticker,
    Iban,
}

const DEFAULT_FIELDS: [Field; 9] = [
    Field::Label,
    Field::Name,
    Field::Comment,
    Field::Id,
    Field::Isin,
    Field::Wkn,
    Field::Ticker,
    Field::Iban,
    Field::Currency,
];

impl Field {
    pub(crate) fn parse(name: &str) -> Result<Field, QueryError> {
        Ok(match name {
            "id" => Field::Id,
            "name" => Field::Name,
            "label" => Field::Label,
            "type" => Field::Type,
            "class" => Field::Class,
            "category" => Field::Category,
            "currency" => Field::Currency,
            "comment" => Field::Comment,
            "isin" => Field::Isin,
            "wkn" => Field::Wkn,
            "ticker" => Field::Ticker,
            "iban" => Field::Iban,
            _ => return Err(QueryError::UnknownField(name.to_string())),
        })
    }
}

/// Sortable keys.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum SortKey {
    Date,
    Num,
    Id,
    Name,
    Type,
    Class,
    Category,
    Currency,
    Value,
    Quantity,
    Price,
    Cost,
}

impl SortKey {
    pub(crate) fn parse(name: &str) -> Result<SortKey, QueryError> {
        Ok(match name.to_ascii_lowercase().as_str() {
            "date" => SortKey::Date,
            "num" => SortKey::Num,
            "id" => SortKey::Id,
            "name" => SortKey::Name,
            "type" => SortKey::Type,
            "class" => SortKey::Class,
            "category" => SortKey::Category,
            "currency" => SortKey::Currency,
            "value" => SortKey::Value,
            "quantity" => SortKey::Quantity,
            "price" => SortKey::Price,
            "cost" => SortKey::Cost,
            _ => return Err(QueryError::UnknownSortKey(name.to_string())),
        })
    }

    pub(crate) fn compare(self, a: &Row<'_>, b: &Row<'_>) -> Ordering {
        let text = |r: &Row<'_>, f: Field| {
            r.values(f)
                .first()
                .map(|s| s.to_lowercase())
                .unwrap_or_default()
        };
        let by_text = |f: Field| text(a, f).cmp(&text(b, f));
        let by_micros = |get: fn(&LedgerEntry) -> Micros| get(a.entry).cmp(&get(b.entry));

        match self {
            SortKey::Date => a.entry.date().cmp(&b.entry.date()),
            SortKey::Num => a.entry.sequence_num.cmp(&b.entry.sequence_num),
            SortKey::Id => by_text(Field::Id),
            SortKey::Name => by_text(Field::Name),
            SortKey::Type => by_text(Field::Type),
            SortKey::Class => by_text(Field::Class),
            SortKey::Category => by_text(Field::Category),
            SortKey::Currency => by_text(Field::Currency),
            SortKey::Value => by_micros(|e| e.value_micros),
            SortKey::Quantity => by_micros(|e| e.quantity_micros),
            SortKey::Price => by_micros(|e| e.price_micros),
            SortKey::Cost => by_micros(|e| e.cost_micros),
        }
    }
}

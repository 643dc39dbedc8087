//! kto-query
//!
//! Text filter/sort/limit language over ledger entries, e.g.
//! `nestle year:2024 !type~price|rate order:-value max:3`.
//! See [`Query`] for the grammar.

mod error;
mod lexer;
mod macros;
mod query;
mod row;

pub use error::QueryError;
pub use macros::MacroTable;
pub use query::Query;
pub use row::Row;

use kto_ledger::Store;

/// Run `query` against every entry in `store`.
pub fn search<'a>(store: &'a Store, query: &Query) -> Vec<Row<'a>> {
    query.apply(store.rows().into_iter().map(|(e, a)| Row::new(e, a)))
}

//! JSON-pointer prefixes the workspace actually reads from the merged config.
//!
//! A leaf under any of these prefixes is consumed; anything else is reported
//! by [`crate::report_unused_keys`]. Keep this list in step with
//! [`crate::AppConfig`] and [`crate::resolve_quote_api_key`].

pub static CONSUMED_POINTERS: &[&str] = &[
    "/ledger/path",
    "/ledger/base_currency",
    "/logging/filter",
    // whole subtree: one key per macro name
    "/query/macros",
    "/quotes/file",
    "/quotes/api_key_env",
];

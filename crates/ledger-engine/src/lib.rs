//! # ledger-engine
//!
//! Deterministic resolution of free text for an accounting assistant.
//!
//! The assistant's tool calls carry phrases like "last month", "Nov 5th" or
//! "office supplies". This crate turns them into concrete dates and record
//! ids, or into structured ambiguity the assistant can ask the user about.
//! Every function is pure: the caller supplies the anchor date, the
//! candidate records and, for exchange rates, the current instant.
//!
//! ## Modules
//!
//! - [`date_query`] — date phrase → single day or range, never failing on unknown text
//! - [`relative_date`] — single date field parsing ("next friday", "13/02/2024")
//! - [`entities`] — account-scoped categories, vendors, clients, tax rates
//! - [`entity_match`] — exact-then-fuzzy name matching with explicit ambiguity
//! - [`tools`] — typed expense/budget/invoice requests and their resolution plan
//! - [`rates`] — exchange-rate cache over an injected source with a TTL
//! - [`error`] — Error types

pub mod date_query;
pub mod entities;
pub mod entity_match;
pub mod error;
pub mod rates;
pub mod relative_date;
pub mod tools;

pub use date_query::{
    resolve_date_query, resolve_date_query_with_options, DateQuery, ResolveOptions, WeekStartDay,
};
pub use entities::{Category, CategoryKind, Client, Named, TaxRate, Vendor};
pub use entity_match::{
    match_category, match_client, match_entities, match_entity_by_name, match_tax_rate,
    match_vendor, MatchOutcome, MatchResult,
};
pub use error::EngineError;
pub use rates::{FixedRates, RateCache, RateSource};
pub use relative_date::parse_relative_date;
pub use tools::{plan_tool_request, Catalog, ToolPlan, ToolRequest};

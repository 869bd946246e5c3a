//! Pricing catalog and cost engine for comparing LLM API spend across
//! providers, models and billing methods.
//!
//! Everything here is pure: a [`Catalog`] plus an [`EffectiveUsage`] always
//! produce the same quotes.

pub mod catalog;
pub mod compare;
pub mod cost;
pub mod error;
pub mod types;
pub mod usage;

pub use catalog::Catalog;
pub use compare::{compare_all, QuoteFilter, SortKey};
pub use cost::quote;
pub use error::{CatalogError, UsageError};
pub use types::{BillingMethod, Breakdown, PricedQuote};
pub use usage::{CallVolume, EffectiveUsage, UsageProfile};

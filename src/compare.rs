use std::cmp::Ordering;

use serde::Serialize;
use tracing::debug;

use crate::catalog::Catalog;
use crate::cost::price_model;
use crate::types::{BillingMethod, PricedQuote};
use crate::usage::EffectiveUsage;

/// Price every method of every model in catalog order.
///
/// Models contribute one quote per billing method they define; methods they
/// don't define are skipped, not priced as zero.
pub fn compare_all(catalog: &Catalog, usage: &EffectiveUsage) -> Vec<PricedQuote> {
    let quotes: Vec<PricedQuote> = catalog
        .providers
        .iter()
        .flat_map(move |provider| {
            provider.models.iter().flat_map(move |model| {
                BillingMethod::ALL
                    .into_iter()
                    .filter_map(move |method| price_model(provider, model, method, usage))
            })
        })
        .collect();

    debug!(
        "Priced {} quotes across {} models",
        quotes.len(),
        catalog.model_count()
    );
    quotes
}

/// Narrow a quote list the way the comparison view does.
#[derive(Debug, Clone, Default)]
pub struct QuoteFilter {
    /// Exact provider name.
    pub provider: Option<String>,
    pub method: Option<BillingMethod>,
    /// Case-insensitive substring of the model or provider name.
    pub search: Option<String>,
}

impl QuoteFilter {
    pub fn matches(&self, quote: &PricedQuote) -> bool {
        if self.provider.as_ref().is_some_and(|p| *p != quote.provider) {
            return false;
        }
        if self.method.is_some_and(|m| m != quote.method) {
            return false;
        }
        if let Some(needle) = &self.search {
            let needle = needle.to_lowercase();
            return quote.model.to_lowercase().contains(&needle)
                || quote.provider.to_lowercase().contains(&needle);
        }
        true
    }

    pub fn apply(&self, quotes: Vec<PricedQuote>) -> Vec<PricedQuote> {
        quotes.into_iter().filter(|q| self.matches(q)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    TotalCost,
    CostPerCall,
    Provider,
    Model,
}

/// Total order over quotes: total cost, cost per call, provider, model,
/// then method.
pub fn total_order(a: &PricedQuote, b: &PricedQuote) -> Ordering {
    a.total_cost
        .total_cmp(&b.total_cost)
        .then_with(|| a.cost_per_call.total_cmp(&b.cost_per_call))
        .then_with(|| a.provider.cmp(&b.provider))
        .then_with(|| a.model.cmp(&b.model))
        .then_with(|| a.method.cmp(&b.method))
}

pub fn sort_quotes(quotes: &mut [PricedQuote], key: SortKey) {
    quotes.sort_by(|a, b| {
        let primary = match key {
            SortKey::TotalCost => Ordering::Equal,
            SortKey::CostPerCall => a.cost_per_call.total_cmp(&b.cost_per_call),
            SortKey::Provider => a.provider.cmp(&b.provider),
            SortKey::Model => a.model.cmp(&b.model),
        };
        primary.then_with(|| total_order(a, b))
    });
}

pub fn cheapest(quotes: &[PricedQuote]) -> Option<&PricedQuote> {
    quotes.iter().min_by(|a, b| total_order(a, b))
}

/// Where a quote's total cost sits within the range of the quotes shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CostTier {
    Low,
    Medium,
    High,
}

impl CostTier {
    pub fn label(&self) -> &'static str {
        match self {
            CostTier::Low => "low",
            CostTier::Medium => "medium",
            CostTier::High => "high",
        }
    }
}

/// Tier per quote, in input order. All `None` when there are fewer than two
/// quotes or every quote costs the same.
pub fn cost_tiers(quotes: &[PricedQuote]) -> Vec<Option<CostTier>> {
    let min = quotes.iter().map(|q| q.total_cost).fold(f64::INFINITY, f64::min);
    let max = quotes
        .iter()
        .map(|q| q.total_cost)
        .fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if quotes.len() < 2 || range <= 0.0 {
        return vec![None; quotes.len()];
    }

    quotes
        .iter()
        .map(|q| {
            let position = (q.total_cost - min) / range;
            Some(if position < 0.33 {
                CostTier::Low
            } else if position < 0.66 {
                CostTier::Medium
            } else {
                CostTier::High
            })
        })
        .collect()
}

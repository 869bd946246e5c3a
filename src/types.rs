use std::fmt;

use serde::{Deserialize, Serialize};

/// Billing methods a model can be priced under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingMethod {
    PayPerToken,
    ProvisionedThroughput,
    PerCall,
}

impl BillingMethod {
    pub const ALL: [BillingMethod; 3] = [
        BillingMethod::PayPerToken,
        BillingMethod::ProvisionedThroughput,
        BillingMethod::PerCall,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BillingMethod::PayPerToken => "Pay per Token",
            BillingMethod::ProvisionedThroughput => "PTU",
            BillingMethod::PerCall => "API Calls",
        }
    }
}

impl fmt::Display for BillingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Number of tokens a provider's pay-per-token rates are quoted for.
///
/// Stored in the catalog as the plain integer `1000` or `1000000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub enum TokenUnit {
    Thousand,
    Million,
}

impl TokenUnit {
    pub fn size(self) -> f64 {
        match self {
            TokenUnit::Thousand => 1_000.0,
            TokenUnit::Million => 1_000_000.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TokenUnit::Thousand => "1K",
            TokenUnit::Million => "1M",
        }
    }
}

impl TryFrom<u64> for TokenUnit {
    type Error = String;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            1_000 => Ok(TokenUnit::Thousand),
            1_000_000 => Ok(TokenUnit::Million),
            other => Err(format!(
                "unsupported token unit {other}, expected 1000 or 1000000"
            )),
        }
    }
}

impl From<TokenUnit> for u64 {
    fn from(unit: TokenUnit) -> Self {
        match unit {
            TokenUnit::Thousand => 1_000,
            TokenUnit::Million => 1_000_000,
        }
    }
}

/// What a [`Rate`] is charged against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateBasis {
    Tokens(TokenUnit),
    Hour,
    Call,
}

/// A USD amount together with the unit it is charged per.
///
/// Displays as e.g. `$0.0025/1K tokens`, `$2/hour` or `$0.05/call`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(into = "LabeledRate")]
pub struct Rate {
    pub amount: f64,
    pub basis: RateBasis,
}

impl Rate {
    pub fn per_tokens(amount: f64, unit: TokenUnit) -> Self {
        Self {
            amount,
            basis: RateBasis::Tokens(unit),
        }
    }

    pub fn per_hour(amount: f64) -> Self {
        Self {
            amount,
            basis: RateBasis::Hour,
        }
    }

    pub fn per_call(amount: f64) -> Self {
        Self {
            amount,
            basis: RateBasis::Call,
        }
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.basis {
            RateBasis::Tokens(unit) => write!(f, "${}/{} tokens", self.amount, unit.label()),
            RateBasis::Hour => write!(f, "${}/hour", self.amount),
            RateBasis::Call => write!(f, "${}/call", self.amount),
        }
    }
}

#[derive(Serialize)]
struct LabeledRate {
    amount: f64,
    basis: RateBasis,
    label: String,
}

impl From<Rate> for LabeledRate {
    fn from(rate: Rate) -> Self {
        Self {
            amount: rate.amount,
            basis: rate.basis,
            label: rate.to_string(),
        }
    }
}

/// Pay-per-token detail. Costs are for a single call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenBreakdown {
    pub input_cost_per_call: f64,
    pub output_cost_per_call: f64,
    pub input_rate: Rate,
    pub output_rate: Rate,
    pub long_context: bool,
    pub total_calls: f64,
}

/// Provisioned-throughput detail: the capacity sized for the workload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacityBreakdown {
    pub hourly_rate: Rate,
    pub hours: f64,
    pub required_units: u64,
    pub tokens_per_minute: f64,
    pub max_tpm_capacity: u64,
    pub utilization_percent: f64,
    pub total_calls: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallBreakdown {
    pub per_call_rate: Rate,
    pub total_calls: f64,
    pub description: String,
}

/// Method-specific detail of a [`PricedQuote`].
///
/// Serialized with a `method` tag using the same names as [`BillingMethod`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Breakdown {
    PayPerToken(TokenBreakdown),
    ProvisionedThroughput(CapacityBreakdown),
    PerCall(CallBreakdown),
}

impl Breakdown {
    pub fn method(&self) -> BillingMethod {
        match self {
            Breakdown::PayPerToken(_) => BillingMethod::PayPerToken,
            Breakdown::ProvisionedThroughput(_) => BillingMethod::ProvisionedThroughput,
            Breakdown::PerCall(_) => BillingMethod::PerCall,
        }
    }
}

/// One priced (provider, model, method) combination.
///
/// All amounts are USD at full precision; rounding is left to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedQuote {
    pub provider: String,
    pub model: String,
    pub method: BillingMethod,
    pub cost_per_call: f64,
    pub total_cost: f64,
    pub breakdown: Breakdown,
}

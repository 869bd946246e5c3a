use crate::catalog::{Catalog, Model, PayPerToken, PerCall, Provider, ProvisionedThroughput};
use crate::types::{
    BillingMethod, Breakdown, CallBreakdown, CapacityBreakdown, PricedQuote, Rate, TokenBreakdown,
    TokenUnit,
};
use crate::usage::EffectiveUsage;

/// Provider conventions a billing rule needs besides its own rates.
#[derive(Debug, Clone, Copy)]
pub struct PricingContext {
    pub token_unit: TokenUnit,
    pub long_context_tiering: bool,
}

impl PricingContext {
    pub fn for_model(provider: &Provider, model: &Model) -> Self {
        Self {
            token_unit: provider.token_unit,
            long_context_tiering: provider.tiering_for(model),
        }
    }
}

/// Cost of a workload under one billing rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Charge {
    pub cost_per_call: f64,
    pub total_cost: f64,
    pub breakdown: Breakdown,
}

/// A billing-method definition that can price an [`EffectiveUsage`].
pub trait BillingRule {
    fn method(&self) -> BillingMethod;

    fn charge(&self, ctx: &PricingContext, usage: &EffectiveUsage) -> Charge;
}

impl PayPerToken {
    /// Input and output rates for a call of `total_tokens`, and whether the
    /// long-context tier was selected. The tier starts strictly above the
    /// threshold.
    pub fn rates_for(&self, total_tokens: u64, tiering: bool) -> (f64, f64, bool) {
        match &self.long_context {
            Some(lc) if tiering && total_tokens > lc.threshold => {
                (lc.input_rate, lc.output_rate, true)
            }
            _ => (self.input_rate, self.output_rate, false),
        }
    }
}

impl BillingRule for PayPerToken {
    fn method(&self) -> BillingMethod {
        BillingMethod::PayPerToken
    }

    fn charge(&self, ctx: &PricingContext, usage: &EffectiveUsage) -> Charge {
        let (input_rate, output_rate, long_context) =
            self.rates_for(usage.total_tokens(), ctx.long_context_tiering);
        let unit = ctx.token_unit;

        let input_cost = usage.input_tokens as f64 / unit.size() * input_rate;
        let output_cost = usage.output_tokens as f64 / unit.size() * output_rate;
        let cost_per_call = input_cost + output_cost;

        Charge {
            cost_per_call,
            total_cost: cost_per_call * usage.calls,
            breakdown: Breakdown::PayPerToken(TokenBreakdown {
                input_cost_per_call: input_cost,
                output_cost_per_call: output_cost,
                input_rate: Rate::per_tokens(input_rate, unit),
                output_rate: Rate::per_tokens(output_rate, unit),
                long_context,
                total_calls: usage.calls,
            }),
        }
    }
}

impl BillingRule for ProvisionedThroughput {
    fn method(&self) -> BillingMethod {
        BillingMethod::ProvisionedThroughput
    }

    /// Capacity is sized in whole units for the workload's peak
    /// tokens-per-minute and billed for every hour it is held.
    fn charge(&self, _ctx: &PricingContext, usage: &EffectiveUsage) -> Charge {
        let tokens_per_minute = usage.tokens_per_minute(self.output_token_ratio);
        let required_units = (tokens_per_minute / self.max_input_tpm_per_unit as f64).ceil() as u64;
        let max_tpm_capacity = required_units.saturating_mul(self.max_input_tpm_per_unit);

        let utilization_percent = if max_tpm_capacity == 0 {
            0.0
        } else {
            (tokens_per_minute / max_tpm_capacity as f64 * 100.0).min(100.0)
        };

        let total_cost = required_units as f64 * self.hourly_rate * usage.hours;

        Charge {
            cost_per_call: total_cost / usage.calls,
            total_cost,
            breakdown: Breakdown::ProvisionedThroughput(CapacityBreakdown {
                hourly_rate: Rate::per_hour(self.hourly_rate),
                hours: usage.hours,
                required_units,
                tokens_per_minute,
                max_tpm_capacity,
                utilization_percent,
                total_calls: usage.calls,
                description: self.description.clone(),
            }),
        }
    }
}

impl BillingRule for PerCall {
    fn method(&self) -> BillingMethod {
        BillingMethod::PerCall
    }

    fn charge(&self, _ctx: &PricingContext, usage: &EffectiveUsage) -> Charge {
        Charge {
            cost_per_call: self.rate,
            total_cost: self.rate * usage.calls,
            breakdown: Breakdown::PerCall(CallBreakdown {
                per_call_rate: Rate::per_call(self.rate),
                total_calls: usage.calls,
                description: self.description.clone(),
            }),
        }
    }
}

/// The model's definition for `method`, if it has one.
pub fn rule_for(model: &Model, method: BillingMethod) -> Option<&dyn BillingRule> {
    match method {
        BillingMethod::PayPerToken => model
            .pay_per_token
            .as_ref()
            .map(|r| r as &dyn BillingRule),
        BillingMethod::ProvisionedThroughput => model
            .provisioned_throughput
            .as_ref()
            .map(|r| r as &dyn BillingRule),
        BillingMethod::PerCall => model.per_call.as_ref().map(|r| r as &dyn BillingRule),
    }
}

/// Price one model under one method. `None` when the model does not
/// define that method.
pub fn price_model(
    provider: &Provider,
    model: &Model,
    method: BillingMethod,
    usage: &EffectiveUsage,
) -> Option<PricedQuote> {
    let rule = rule_for(model, method)?;
    let charge = rule.charge(&PricingContext::for_model(provider, model), usage);
    debug_assert_eq!(charge.breakdown.method(), rule.method());

    Some(PricedQuote {
        provider: provider.name.clone(),
        model: model.name.clone(),
        method: rule.method(),
        cost_per_call: charge.cost_per_call,
        total_cost: charge.total_cost,
        breakdown: charge.breakdown,
    })
}

/// Single-quote calculator. `None` for an unknown provider or model, or a
/// method the model does not offer.
///
/// Prices through the same rules as [`crate::compare_all`], so the total
/// covers every call in `usage` for all three methods.
pub fn quote(
    catalog: &Catalog,
    provider: &str,
    model: &str,
    method: BillingMethod,
    usage: &EffectiveUsage,
) -> Option<PricedQuote> {
    let (p, m) = catalog.model(provider, model)?;
    price_model(p, m, method, usage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usage::{CallVolume, UsageProfile};

    const EPS: f64 = 1e-9;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    fn usage(input_tokens: u64, output_tokens: u64, calls: u64, hours: f64) -> EffectiveUsage {
        UsageProfile {
            input_tokens,
            output_tokens,
            volume: CallVolume::Total { calls, hours },
        }
        .resolve()
        .unwrap()
    }

    fn embedded() -> Catalog {
        Catalog::embedded().unwrap()
    }

    #[test]
    fn per_thousand_pay_per_token() {
        let q = quote(
            &embedded(),
            "Azure OpenAI",
            "GPT-4o",
            BillingMethod::PayPerToken,
            &usage(1000, 500, 1, 1.0),
        )
        .unwrap();

        let Breakdown::PayPerToken(b) = &q.breakdown else {
            panic!("expected token breakdown");
        };
        assert!(approx(b.input_cost_per_call, 0.0025));
        assert!(approx(b.output_cost_per_call, 0.005));
        assert!(approx(q.total_cost, 0.0075));
        assert_eq!(b.input_rate.to_string(), "$0.0025/1K tokens");
        assert!(!b.long_context);
    }

    #[test]
    fn long_context_rates_above_threshold() {
        let q = quote(
            &embedded(),
            "Google Vertex AI",
            "Gemini 2.5 Pro",
            BillingMethod::PayPerToken,
            &usage(150_000, 60_000, 1, 1.0),
        )
        .unwrap();

        let Breakdown::PayPerToken(b) = &q.breakdown else {
            panic!("expected token breakdown");
        };
        assert!(b.long_context);
        assert!(approx(b.input_cost_per_call, 0.375));
        assert!(approx(b.output_cost_per_call, 0.9));
        assert!(approx(q.total_cost, 1.275));
        assert_eq!(b.output_rate.to_string(), "$15/1M tokens");
    }

    #[test]
    fn threshold_is_strictly_greater_than() {
        let catalog = embedded();
        let price = |input| {
            let q = quote(
                &catalog,
                "Google Vertex AI",
                "Gemini 2.5 Pro",
                BillingMethod::PayPerToken,
                &usage(input, 0, 1, 1.0),
            )
            .unwrap();
            match q.breakdown {
                Breakdown::PayPerToken(b) => b.long_context,
                _ => unreachable!(),
            }
        };
        assert!(!price(200_000));
        assert!(price(200_001));
    }

    #[test]
    fn tiering_disabled_ignores_long_context_rates() {
        let mut catalog = embedded();
        catalog.providers[2].long_context_tiering = false;
        let q = quote(
            &catalog,
            "Google Vertex AI",
            "Gemini 2.5 Pro",
            BillingMethod::PayPerToken,
            &usage(150_000, 60_000, 1, 1.0),
        )
        .unwrap();
        assert!(approx(q.total_cost, 0.1875 + 0.6));
    }

    #[test]
    fn single_quote_capacity_with_one_call_is_flat_hourly() {
        let q = quote(
            &embedded(),
            "Azure OpenAI",
            "GPT-4o",
            BillingMethod::ProvisionedThroughput,
            &usage(1000, 500, 1, 3.0),
        )
        .unwrap();

        let Breakdown::ProvisionedThroughput(b) = &q.breakdown else {
            panic!("expected capacity breakdown");
        };
        assert_eq!(b.required_units, 1);
        assert!(approx(q.total_cost, 2.0 * 3.0));
        assert_eq!(b.hourly_rate.to_string(), "$2/hour");
    }

    #[test]
    fn capacity_sized_from_throughput() {
        let q = quote(
            &embedded(),
            "Azure OpenAI",
            "GPT-4o",
            BillingMethod::ProvisionedThroughput,
            &usage(1000, 500, 600, 1.0),
        )
        .unwrap();

        let Breakdown::ProvisionedThroughput(b) = &q.breakdown else {
            panic!("expected capacity breakdown");
        };
        assert!(approx(b.tokens_per_minute, 30_000.0));
        assert_eq!(b.required_units, 12);
        assert_eq!(b.max_tpm_capacity, 30_000);
        assert!(approx(b.utilization_percent, 100.0));
        assert!(approx(q.total_cost, 24.0));
        assert!(approx(q.cost_per_call, 0.04));
    }

    #[test]
    fn zero_throughput_needs_no_capacity() {
        let q = quote(
            &embedded(),
            "Azure OpenAI",
            "GPT-4o",
            BillingMethod::ProvisionedThroughput,
            &usage(0, 0, 10, 1.0),
        )
        .unwrap();
        let Breakdown::ProvisionedThroughput(b) = &q.breakdown else {
            panic!("expected capacity breakdown");
        };
        assert_eq!(b.required_units, 0);
        assert_eq!(b.utilization_percent, 0.0);
        assert_eq!(q.total_cost, 0.0);
    }

    #[test]
    fn per_call_is_rate_times_calls() {
        let q = quote(
            &embedded(),
            "Anthropic",
            "Claude Opus 4",
            BillingMethod::PerCall,
            &usage(0, 0, 250, 1.0),
        )
        .unwrap();
        assert_eq!(q.total_cost, 0.05 * 250.0);
        assert_eq!(q.cost_per_call, 0.05);
    }

    #[test]
    fn pay_per_token_total_covers_every_call() {
        let q = quote(
            &embedded(),
            "Azure OpenAI",
            "GPT-4o",
            BillingMethod::PayPerToken,
            &usage(1000, 500, 10, 1.0),
        )
        .unwrap();
        assert!(approx(q.cost_per_call, 0.0075));
        assert!(approx(q.total_cost, 0.075));
    }

    #[test]
    fn fractional_rate_form_bills_fractional_calls() {
        let usage = UsageProfile {
            input_tokens: 0,
            output_tokens: 0,
            volume: CallVolume::Rate {
                calls_per_minute: 10,
                duration_minutes: 0.25,
            },
        }
        .resolve()
        .unwrap();
        let q = quote(
            &embedded(),
            "Anthropic",
            "Claude Opus 4",
            BillingMethod::PerCall,
            &usage,
        )
        .unwrap();
        assert!(approx(q.total_cost, 0.125));
        let Breakdown::PerCall(b) = &q.breakdown else {
            panic!("expected per-call breakdown");
        };
        assert_eq!(b.total_calls, 2.5);
    }

    #[test]
    fn unknown_or_unsupported_is_none() {
        let catalog = embedded();
        let u = usage(1, 1, 1, 1.0);
        assert!(quote(&catalog, "Nobody", "GPT-4o", BillingMethod::PayPerToken, &u).is_none());
        assert!(quote(&catalog, "Azure OpenAI", "Nope", BillingMethod::PayPerToken, &u).is_none());
        // Anthropic offers per-call billing, Azure models do not.
        assert!(quote(&catalog, "Azure OpenAI", "GPT-4o", BillingMethod::PerCall, &u).is_none());
        assert!(
            quote(&catalog, "Anthropic", "Claude 3 Haiku", BillingMethod::ProvisionedThroughput, &u)
                .is_none()
        );
    }

    #[test]
    fn pay_per_token_is_monotonic() {
        let catalog = embedded();
        let steps = [0u64, 1, 999, 50_000, 199_999, 200_000, 200_001, 1_000_000];
        for provider in &catalog.providers {
            for model in &provider.models {
                let Some(rule) = &model.pay_per_token else {
                    continue;
                };
                let ctx = PricingContext::for_model(provider, model);
                for fixed in [0u64, 10_000, 150_000] {
                    let mut last_in = 0.0;
                    let mut last_out = 0.0;
                    for &n in &steps {
                        let by_input = rule.charge(&ctx, &usage(n, fixed, 1, 1.0)).total_cost;
                        let by_output = rule.charge(&ctx, &usage(fixed, n, 1, 1.0)).total_cost;
                        assert!(by_input >= last_in, "{} input {n}", model.name);
                        assert!(by_output >= last_out, "{} output {n}", model.name);
                        last_in = by_input;
                        last_out = by_output;
                    }
                }
            }
        }
    }
}

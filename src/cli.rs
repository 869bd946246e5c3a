use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;

use llmcost::compare::SortKey;
use llmcost::usage::{
    CallVolume, UsageProfile, DEFAULT_CALLS, DEFAULT_CALLS_PER_MINUTE, DEFAULT_DURATION_MINUTES,
    DEFAULT_HOURS, DEFAULT_INPUT_TOKENS, DEFAULT_OUTPUT_TOKENS,
};
use llmcost::BillingMethod;

#[derive(Parser, Debug)]
#[command(
    name = "llmcost",
    about = "Compare LLM API costs across providers, models and billing methods"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Pricing catalog (TOML, or JSON by extension). Defaults to the built-in snapshot
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Output format: table (default), json, csv
    #[arg(long, global = true, default_value = "table")]
    pub format: OutputFormat,

    /// Currency code (ISO 4217) for cost display, e.g. EUR, GBP
    #[arg(long, global = true)]
    pub currency: Option<String>,

    /// Log catalog loading and pricing details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Workload description shared by `compare` and `quote`.
#[derive(Args, Debug, Clone, Default)]
pub struct UsageArgs {
    /// Input tokens per call [default: 1000]
    #[arg(long)]
    pub input_tokens: Option<u64>,

    /// Output tokens per call [default: 500]
    #[arg(long)]
    pub output_tokens: Option<u64>,

    /// Total API calls [default: 1]
    #[arg(long, conflicts_with = "calls_per_minute")]
    pub calls: Option<u64>,

    /// Hours the workload runs, for provisioned throughput [default: 1]
    #[arg(long, conflicts_with = "calls_per_minute")]
    pub hours: Option<f64>,

    /// Steady call rate; switches to rate-based usage [default: 10]
    #[arg(long)]
    pub calls_per_minute: Option<u64>,

    /// Minutes the call rate is sustained; switches to rate-based usage [default: 60]
    #[arg(long, conflicts_with_all = ["calls", "hours"])]
    pub duration: Option<f64>,
}

impl UsageArgs {
    pub fn to_profile(&self) -> UsageProfile {
        let volume = if self.calls_per_minute.is_some() || self.duration.is_some() {
            CallVolume::Rate {
                calls_per_minute: self.calls_per_minute.unwrap_or(DEFAULT_CALLS_PER_MINUTE),
                duration_minutes: self.duration.unwrap_or(DEFAULT_DURATION_MINUTES),
            }
        } else {
            CallVolume::Total {
                calls: self.calls.unwrap_or(DEFAULT_CALLS),
                hours: self.hours.unwrap_or(DEFAULT_HOURS),
            }
        };

        UsageProfile {
            input_tokens: self.input_tokens.unwrap_or(DEFAULT_INPUT_TOKENS),
            output_tokens: self.output_tokens.unwrap_or(DEFAULT_OUTPUT_TOKENS),
            volume,
        }
    }
}

pub const DEFAULT_COLUMNS: &[&str] = &["provider", "model", "method", "per_call", "total"];

/// Resolve `--columns` into a final list.
/// - No flag → defaults
/// - All prefixed with +/- → modify defaults (e.g. `+tier,-per_call`)
/// - Plain names → explicit replacement (e.g. `model,total`)
pub fn resolve_columns(raw: Option<Vec<String>>) -> Vec<String> {
    let Some(raw) = raw else {
        return DEFAULT_COLUMNS.iter().map(|s| s.to_string()).collect();
    };

    let is_modifier = raw.iter().all(|c| c.starts_with('+') || c.starts_with('-'));

    if !is_modifier {
        return raw;
    }

    let mut cols: Vec<String> = DEFAULT_COLUMNS.iter().map(|s| s.to_string()).collect();
    for entry in &raw {
        if let Some(name) = entry.strip_prefix('+') {
            if !cols.iter().any(|c| c == name) {
                cols.push(name.to_string());
            }
        } else if let Some(name) = entry.strip_prefix('-') {
            cols.retain(|c| c != name);
        }
    }
    cols
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Price every model and billing method in the catalog (default)
    Compare {
        #[command(flatten)]
        usage: UsageArgs,

        /// Only show this provider (exact name)
        #[arg(long)]
        provider: Option<String>,

        /// Only show this billing method
        #[arg(long)]
        method: Option<MethodArg>,

        /// Case-insensitive search over model and provider names
        #[arg(long)]
        search: Option<String>,

        /// Sort order [default: total-cost]
        #[arg(long)]
        sort: Option<SortArg>,

        /// Show a detail row under each quote
        #[arg(long)]
        breakdown: bool,

        /// Columns to display (comma-separated).
        /// Use +col to add, -col to remove from defaults, or plain names to replace.
        /// Available: provider,model,method,per_call,total,tier,units,utilization
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        columns: Option<Vec<String>>,
    },
    /// Price a single provider / model / billing method
    Quote {
        provider: String,
        model: String,
        method: MethodArg,

        #[command(flatten)]
        usage: UsageArgs,
    },
    /// List providers in the catalog
    Providers {
        /// Include pricing reference links
        #[arg(long)]
        references: bool,
    },
    /// List a provider's models and the methods each supports
    Models { provider: String },
    /// List the billing methods offered by a provider
    Methods { provider: String },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq)]
pub enum MethodArg {
    #[value(alias = "token")]
    PayPerToken,
    #[value(alias = "ptu")]
    ProvisionedThroughput,
    #[value(alias = "api-calls")]
    PerCall,
}

impl From<MethodArg> for BillingMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::PayPerToken => BillingMethod::PayPerToken,
            MethodArg::ProvisionedThroughput => BillingMethod::ProvisionedThroughput,
            MethodArg::PerCall => BillingMethod::PerCall,
        }
    }
}

#[derive(ValueEnum, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum SortArg {
    TotalCost,
    CostPerCall,
    Provider,
    Model,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::TotalCost => SortKey::TotalCost,
            SortArg::CostPerCall => SortKey::CostPerCall,
            SortArg::Provider => SortKey::Provider,
            SortArg::Model => SortKey::Model,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, PartialEq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl Cli {
    pub fn effective_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Compare {
            usage: UsageArgs::default(),
            provider: None,
            method: None,
            search: None,
            sort: None,
            breakdown: false,
            columns: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_compare() {
        let cli = Cli::parse_from(["llmcost"]);
        assert!(matches!(cli.effective_command(), Command::Compare { .. }));
        assert_eq!(cli.format, OutputFormat::Table);
    }

    #[test]
    fn usage_defaults_match_the_form() {
        let profile = UsageArgs::default().to_profile();
        assert_eq!(profile, UsageProfile::default());
    }

    #[test]
    fn calls_per_minute_switches_to_rate_form() {
        let cli = Cli::parse_from([
            "llmcost",
            "compare",
            "--calls-per-minute",
            "20",
            "--duration",
            "30",
        ]);
        let Some(Command::Compare { usage, .. }) = cli.command else {
            panic!("expected compare");
        };
        assert_eq!(
            usage.to_profile().volume,
            CallVolume::Rate {
                calls_per_minute: 20,
                duration_minutes: 30.0
            }
        );
    }

    #[test]
    fn duration_alone_uses_default_rate() {
        let cli = Cli::parse_from(["llmcost", "compare", "--duration", "30"]);
        let Some(Command::Compare { usage, .. }) = cli.command else {
            panic!("expected compare");
        };
        assert_eq!(
            usage.to_profile().volume,
            CallVolume::Rate {
                calls_per_minute: DEFAULT_CALLS_PER_MINUTE,
                duration_minutes: 30.0
            }
        );
        assert!(Cli::try_parse_from(["llmcost", "--duration", "30", "--hours", "2"]).is_err());
    }

    #[test]
    fn calls_and_rate_conflict() {
        let res = Cli::try_parse_from([
            "llmcost",
            "compare",
            "--calls",
            "5",
            "--calls-per-minute",
            "2",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn quote_accepts_method_aliases() {
        let cli = Cli::parse_from(["llmcost", "quote", "Azure OpenAI", "GPT-4o", "ptu"]);
        let Some(Command::Quote { method, .. }) = cli.command else {
            panic!("expected quote");
        };
        assert_eq!(
            BillingMethod::from(method),
            BillingMethod::ProvisionedThroughput
        );
    }

    #[test]
    fn columns_modifiers_and_replacement() {
        assert_eq!(resolve_columns(None), DEFAULT_COLUMNS);

        let cols = resolve_columns(Some(vec!["+tier".into(), "-per_call".into()]));
        assert_eq!(cols, vec!["provider", "model", "method", "total", "tier"]);

        let cols = resolve_columns(Some(vec!["model".into(), "total".into()]));
        assert_eq!(cols, vec!["model", "total"]);
    }
}

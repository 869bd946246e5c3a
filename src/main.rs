mod cli;
mod config;
mod exchange;
mod output;

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use llmcost::compare::{cost_tiers, sort_quotes, QuoteFilter, SortKey};
use llmcost::{compare_all, quote, BillingMethod, Catalog};

use cli::{Cli, Command, OutputFormat};
use exchange::ExchangeRate;

/// Logs go to stderr so table, JSON and CSV output on stdout stay clean.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    match path {
        Some(p) => Catalog::from_path(p).context("Failed to load pricing catalog"),
        None => Catalog::embedded().context("Built-in pricing catalog is invalid"),
    }
}

/// Why a single quote could not be produced.
fn explain_missing(catalog: &Catalog, provider: &str, model: &str, method: BillingMethod) -> String {
    if catalog.provider(provider).is_none() {
        format!(
            "Unknown provider: {provider} (available: {})",
            catalog.list_providers().join(", ")
        )
    } else if catalog.model(provider, model).is_none() {
        format!(
            "Unknown model {model} for {provider} (available: {})",
            catalog.list_models(provider).join(", ")
        )
    } else {
        format!("{provider} / {model} has no {method} pricing")
    }
}

fn unknown_provider(catalog: &Catalog, provider: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Unknown provider: {provider} (available: {})",
        catalog.list_providers().join(", ")
    )
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = config::load_config();

    let catalog_path = cli.catalog.clone().or(config.catalog.clone());
    let catalog = load_catalog(catalog_path.as_deref())?;
    debug!(
        "Catalog ready: {} providers, {} models",
        catalog.providers.len(),
        catalog.model_count()
    );

    let fx = match cli.currency.as_deref().or(config.currency.as_deref()) {
        Some(code) => exchange::exchange_rate(code, config.exchange_rate),
        None => ExchangeRate::usd(),
    };

    match cli.effective_command() {
        Command::Compare {
            usage,
            provider,
            method,
            search,
            sort,
            breakdown,
            columns,
        } => {
            let usage = usage.to_profile().resolve().context("Invalid usage")?;

            let filter = QuoteFilter {
                provider,
                method: method.map(Into::into),
                search,
            };
            let mut quotes = filter.apply(compare_all(&catalog, &usage));

            let key: SortKey = sort.or(config.sort).map(Into::into).unwrap_or_default();
            sort_quotes(&mut quotes, key);

            if quotes.is_empty() && cli.format == OutputFormat::Table {
                eprintln!("No quotes match the given filters.");
                return Ok(());
            }

            let tiers = cost_tiers(&quotes);
            match cli.format {
                OutputFormat::Table => {
                    let columns = cli::resolve_columns(columns);
                    output::print_table(&quotes, &tiers, &columns, breakdown, &fx);
                }
                OutputFormat::Json => output::print_json(&quotes, &tiers),
                OutputFormat::Csv => output::print_csv(&quotes, &usage, &fx),
            }
        }
        Command::Quote {
            provider,
            model,
            method,
            usage,
        } => {
            let usage = usage.to_profile().resolve().context("Invalid usage")?;
            let method = BillingMethod::from(method);

            let Some(q) = quote(&catalog, &provider, &model, method, &usage) else {
                bail!(explain_missing(&catalog, &provider, &model, method));
            };

            match cli.format {
                OutputFormat::Table => output::print_quote(&q, &fx),
                OutputFormat::Json => output::print_quote_json(&q),
                OutputFormat::Csv => output::print_csv(std::slice::from_ref(&q), &usage, &fx),
            }
        }
        Command::Providers { references } => match cli.format {
            OutputFormat::Table => output::print_providers(&catalog, references),
            OutputFormat::Json => output::print_providers_json(&catalog),
            OutputFormat::Csv => bail!("--format csv is only supported by compare and quote"),
        },
        Command::Models { provider } => {
            let p = catalog
                .provider(&provider)
                .ok_or_else(|| unknown_provider(&catalog, &provider))?;
            match cli.format {
                OutputFormat::Table => output::print_models(p),
                OutputFormat::Json => output::print_models_json(p),
                OutputFormat::Csv => bail!("--format csv is only supported by compare and quote"),
            }
        }
        Command::Methods { provider } => {
            if catalog.provider(&provider).is_none() {
                return Err(unknown_provider(&catalog, &provider));
            }
            let methods = catalog.list_supported_methods(&provider);
            match cli.format {
                OutputFormat::Table => output::print_methods(&methods),
                OutputFormat::Json => output::print_methods_json(&methods),
                OutputFormat::Csv => bail!("--format csv is only supported by compare and quote"),
            }
        }
    }

    Ok(())
}

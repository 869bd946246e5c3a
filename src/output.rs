use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, ContentArrangement, Table};
use serde::Serialize;

use llmcost::catalog::Provider;
use llmcost::compare::CostTier;
use llmcost::types::{BillingMethod, Breakdown, PricedQuote};
use llmcost::{Catalog, EffectiveUsage};

use crate::exchange::ExchangeRate;

const TOTAL_DECIMALS: usize = 4;
const PER_CALL_DECIMALS: usize = 6;

pub const CSV_HEADERS: &[&str] = &[
    "Provider",
    "Model",
    "Pricing Method",
    "Cost",
    "Input Tokens",
    "Output Tokens",
    "API Calls",
    "Hours",
];

fn format_tokens(n: f64) -> String {
    if n >= 1_000_000.0 {
        format!("{:.1}M", n / 1_000_000.0)
    } else if n >= 1_000.0 {
        format!("{:.1}K", n / 1_000.0)
    } else {
        format!("{}", n.round())
    }
}

fn column_header(col: &str) -> &str {
    match col {
        "provider" => "Provider",
        "model" => "Model",
        "method" => "Method",
        "per_call" => "Cost / Call",
        "total" => "Total Cost",
        "tier" => "Tier",
        "units" => "Units",
        "utilization" => "Utilization",
        other => other,
    }
}

fn quote_cell(col: &str, q: &PricedQuote, tier: Option<CostTier>, fx: &ExchangeRate) -> Cell {
    match col {
        "provider" => Cell::new(&q.provider),
        "model" => Cell::new(&q.model),
        "method" => Cell::new(q.method.label()),
        "per_call" => Cell::new(fx.format_cost(q.cost_per_call, PER_CALL_DECIMALS)),
        "total" => Cell::new(fx.format_cost(q.total_cost, TOTAL_DECIMALS)),
        "tier" => Cell::new(tier.map(|t| t.label()).unwrap_or("")),
        "units" => match &q.breakdown {
            Breakdown::ProvisionedThroughput(b) => Cell::new(b.required_units),
            _ => Cell::new(""),
        },
        "utilization" => match &q.breakdown {
            Breakdown::ProvisionedThroughput(b) => {
                Cell::new(format!("{:.1}%", b.utilization_percent))
            }
            _ => Cell::new(""),
        },
        _ => Cell::new(""),
    }
}

/// One-line description of how a quote was priced.
pub fn breakdown_summary(breakdown: &Breakdown, fx: &ExchangeRate) -> String {
    match breakdown {
        Breakdown::PayPerToken(b) => {
            let mut s = format!(
                "input {} @ {}, output {} @ {} per call, {} calls",
                fx.format_cost(b.input_cost_per_call, PER_CALL_DECIMALS),
                b.input_rate,
                fx.format_cost(b.output_cost_per_call, PER_CALL_DECIMALS),
                b.output_rate,
                b.total_calls
            );
            if b.long_context {
                s.push_str(", long context pricing");
            }
            s
        }
        Breakdown::ProvisionedThroughput(b) => format!(
            "{} units @ {} x {}h, {} TPM of {} capacity ({:.1}% utilized), {} calls",
            b.required_units,
            b.hourly_rate,
            b.hours,
            format_tokens(b.tokens_per_minute),
            format_tokens(b.max_tpm_capacity as f64),
            b.utilization_percent,
            b.total_calls
        ),
        Breakdown::PerCall(b) => format!("{} calls @ {}", b.total_calls, b.per_call_rate),
    }
}

fn detail_cell(index: usize, q: &PricedQuote, fx: &ExchangeRate) -> Cell {
    if index == 0 {
        Cell::new(format!("  {}", breakdown_summary(&q.breakdown, fx)))
    } else {
        Cell::new("")
    }
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn print_table(
    quotes: &[PricedQuote],
    tiers: &[Option<CostTier>],
    columns: &[String],
    breakdown: bool,
    fx: &ExchangeRate,
) {
    let mut table = new_table();
    table.set_header(columns.iter().map(|c| Cell::new(column_header(c))));

    for (q, tier) in quotes.iter().zip(tiers) {
        table.add_row(columns.iter().map(|c| quote_cell(c, q, *tier, fx)));

        if breakdown {
            table.add_row((0..columns.len()).map(|i| detail_cell(i, q, fx)));
        }
    }

    println!("{table}");
}

#[derive(Serialize)]
struct QuoteRow<'a> {
    #[serde(flatten)]
    quote: &'a PricedQuote,
    tier: Option<CostTier>,
}

pub fn print_json(quotes: &[PricedQuote], tiers: &[Option<CostTier>]) {
    let rows: Vec<QuoteRow> = quotes
        .iter()
        .zip(tiers)
        .map(|(quote, tier)| QuoteRow { quote, tier: *tier })
        .collect();
    print_pretty_json(&rows);
}

fn print_pretty_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).expect("JSON serialization failed")
    );
}

fn csv_field(value: &str) -> String {
    if value.contains(|c| matches!(c, ',' | '"' | '\n' | '\r')) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// CSV export of quotes with the usage they were priced for. Costs are in
/// the display currency, without symbol.
pub fn render_csv(quotes: &[PricedQuote], usage: &EffectiveUsage, fx: &ExchangeRate) -> String {
    let mut lines = vec![CSV_HEADERS.join(",")];
    for q in quotes {
        let row = [
            csv_field(&q.provider),
            csv_field(&q.model),
            csv_field(q.method.label()),
            format!("{:.*}", TOTAL_DECIMALS, fx.convert(q.total_cost)),
            usage.input_tokens.to_string(),
            usage.output_tokens.to_string(),
            usage.calls.to_string(),
            usage.hours.to_string(),
        ];
        lines.push(row.join(","));
    }
    lines.join("\n")
}

pub fn print_csv(quotes: &[PricedQuote], usage: &EffectiveUsage, fx: &ExchangeRate) {
    println!("{}", render_csv(quotes, usage, fx));
}

/// Field/value view of a single quote.
pub fn print_quote(q: &PricedQuote, fx: &ExchangeRate) {
    let mut table = new_table();
    table.set_header(vec![Cell::new("Field"), Cell::new("Value")]);

    let mut row = |field: &str, value: String| {
        table.add_row(vec![Cell::new(field), Cell::new(value)]);
    };

    row("Provider", q.provider.clone());
    row("Model", q.model.clone());
    row("Method", q.method.label().to_string());
    row("Total Cost", fx.format_cost(q.total_cost, TOTAL_DECIMALS));
    row("Cost / Call", fx.format_cost(q.cost_per_call, PER_CALL_DECIMALS));

    match &q.breakdown {
        Breakdown::PayPerToken(b) => {
            row(
                "Input",
                format!(
                    "{} @ {}",
                    fx.format_cost(b.input_cost_per_call, PER_CALL_DECIMALS),
                    b.input_rate
                ),
            );
            row(
                "Output",
                format!(
                    "{} @ {}",
                    fx.format_cost(b.output_cost_per_call, PER_CALL_DECIMALS),
                    b.output_rate
                ),
            );
            row("Calls", b.total_calls.to_string());
            if b.long_context {
                row("Note", "Long context pricing applied".to_string());
            }
        }
        Breakdown::ProvisionedThroughput(b) => {
            row("Hourly Rate", b.hourly_rate.to_string());
            row("Hours", b.hours.to_string());
            row("Required Units", b.required_units.to_string());
            row("Tokens / Minute", format!("{}", b.tokens_per_minute.round()));
            row("Max TPM Capacity", b.max_tpm_capacity.to_string());
            row("Utilization", format!("{:.1}%", b.utilization_percent));
            row("Calls", b.total_calls.to_string());
            if !b.description.is_empty() {
                row("Note", b.description.clone());
            }
        }
        Breakdown::PerCall(b) => {
            row("Per Call Rate", b.per_call_rate.to_string());
            row("Calls", b.total_calls.to_string());
            if !b.description.is_empty() {
                row("Note", b.description.clone());
            }
        }
    }

    println!("{table}");
}

pub fn print_quote_json(q: &PricedQuote) {
    print_pretty_json(q);
}

fn methods_label(methods: &[BillingMethod]) -> String {
    methods
        .iter()
        .map(|m| m.label())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn print_providers(catalog: &Catalog, references: bool) {
    let mut table = new_table();
    let mut header = vec!["Provider", "Models", "Methods", "Rates per", "Long Context", "Updated"];
    if references {
        header.push("References");
    }
    table.set_header(header);

    for p in &catalog.providers {
        let mut cells = vec![
            Cell::new(&p.name),
            Cell::new(p.models.len()),
            Cell::new(methods_label(&p.supported_methods())),
            Cell::new(format!("{} tokens", p.token_unit.label())),
            Cell::new(if p.long_context_tiering { "yes" } else { "no" }),
            Cell::new(p.last_updated.as_deref().unwrap_or("")),
        ];
        if references {
            let refs: Vec<String> = p
                .references
                .iter()
                .map(|(name, url)| format!("{name}: {url}"))
                .collect();
            cells.push(Cell::new(refs.join("\n")));
        }
        table.add_row(cells);
    }

    println!("{table}");
}

pub fn print_providers_json(catalog: &Catalog) {
    let json: Vec<serde_json::Value> = catalog
        .providers
        .iter()
        .map(|p| {
            serde_json::json!({
                "name": p.name,
                "token_unit": p.token_unit,
                "long_context_tiering": p.long_context_tiering,
                "last_updated": p.last_updated,
                "references": p.references,
                "models": p.models.iter().map(|m| &m.name).collect::<Vec<_>>(),
                "methods": p.supported_methods(),
            })
        })
        .collect();
    print_pretty_json(&json);
}

pub fn print_models(provider: &Provider) {
    let mut table = new_table();
    table.set_header(vec!["Model", "Methods"]);
    for m in &provider.models {
        table.add_row(vec![Cell::new(&m.name), Cell::new(methods_label(&m.methods()))]);
    }
    println!("{table}");
}

pub fn print_models_json(provider: &Provider) {
    let json: Vec<serde_json::Value> = provider
        .models
        .iter()
        .map(|m| serde_json::json!({ "model": m.name, "methods": m.methods() }))
        .collect();
    print_pretty_json(&json);
}

pub fn print_methods(methods: &[BillingMethod]) {
    for m in methods {
        println!("{}", m.label());
    }
}

pub fn print_methods_json(methods: &[BillingMethod]) {
    print_pretty_json(methods);
}

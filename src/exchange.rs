use tracing::warn;

/// Display currency. Engine amounts are USD; conversion happens only when
/// rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRate {
    pub symbol: String,
    pub rate: f64,
    pub code: String,
}

impl ExchangeRate {
    pub fn usd() -> Self {
        Self {
            symbol: "$".to_string(),
            rate: 1.0,
            code: "USD".to_string(),
        }
    }

    pub fn convert(&self, usd: f64) -> f64 {
        usd * self.rate
    }

    pub fn format_cost(&self, usd: f64, decimals: usize) -> String {
        format!("{}{:.*}", self.symbol, decimals, self.convert(usd))
    }
}

fn currency_symbol(code: &str) -> &str {
    match code {
        "USD" => "$",
        "EUR" => "€",
        "GBP" => "£",
        "JPY" => "¥",
        "CNY" => "¥",
        "KRW" => "₩",
        "INR" => "₹",
        "BRL" => "R$",
        "CHF" => "CHF ",
        "CAD" => "CA$",
        "AUD" => "A$",
        "SEK" => "kr ",
        "NOK" => "kr ",
        "DKK" => "kr ",
        "PLN" => "zł",
        "CZK" => "Kč ",
        "TRY" => "₺",
        "THB" => "฿",
        "MXN" => "MX$",
        "ZAR" => "R ",
        _ => "",
    }
}

/// Build the display currency from a code and a configured rate (units of
/// `currency` per USD). Falls back to USD when no usable rate is known.
pub fn exchange_rate(currency: &str, rate: Option<f64>) -> ExchangeRate {
    let code = currency.to_uppercase();

    if code == "USD" {
        return ExchangeRate::usd();
    }

    let Some(rate) = rate.filter(|r| r.is_finite() && *r > 0.0) else {
        warn!(
            "no valid exchange_rate configured for {}, falling back to USD",
            code
        );
        return ExchangeRate::usd();
    };

    let sym = currency_symbol(&code);
    let symbol = if sym.is_empty() {
        format!("{} ", code)
    } else {
        sym.to_string()
    };

    ExchangeRate { symbol, rate, code }
}

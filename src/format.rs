//! Display strings for the CLI. Raw values are never rounded; these helpers
//! only build the `*_display` companions.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::DisplayConfig;

const MILLION: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);
const BILLION: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);
// 10^12 does not fit in the low 32 bits.
const TRILLION: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

fn group_int_digits(int_part: &str) -> String {
    let mut out = String::with_capacity(int_part.len() + int_part.len() / 3);
    let len = int_part.len();
    for (i, ch) in int_part.chars().enumerate() {
        out.push(ch);
        let remaining = len.saturating_sub(i + 1);
        if remaining > 0 && remaining % 3 == 0 {
            out.push(',');
        }
    }
    out
}

/// Pad the fraction with zeros until it has at least `min` digits.
fn pad_fraction(s: &str, min: u32) -> String {
    let (int_part, frac_part) = s.split_once('.').unwrap_or((s, ""));
    if min == 0 && frac_part.is_empty() {
        return int_part.to_string();
    }
    let mut out = format!("{int_part}.{frac_part}");
    for _ in frac_part.len()..min as usize {
        out.push('0');
    }
    out
}

fn group_number_string(s: &str) -> String {
    match s.split_once('.') {
        Some((i, f)) if !f.is_empty() => format!("{}.{f}", group_int_digits(i)),
        Some((i, _)) => group_int_digits(i),
        None => group_int_digits(s),
    }
}

/// Round half away from zero and render with between `min` and `max`
/// fraction digits, without sign.
fn render_abs(value: Decimal, min: u32, max: u32) -> (bool, String) {
    let rounded = value.round_dp_with_strategy(max, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    (negative, pad_fraction(&rounded.abs().normalize().to_string(), min))
}

/// Money formatting options, taken from `[display]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrencyStyle {
    pub symbol: Option<String>,
    pub grouping: bool,
}

impl From<&DisplayConfig> for CurrencyStyle {
    fn from(display: &DisplayConfig) -> Self {
        Self {
            symbol: display.currency_symbol.clone(),
            grouping: display.currency_grouping,
        }
    }
}

impl CurrencyStyle {
    fn assemble(&self, negative: bool, digits: &str, suffix: &str) -> String {
        let digits = if self.grouping {
            group_number_string(digits)
        } else {
            digits.to_string()
        };
        let mut out = String::new();
        if negative {
            out.push('-');
        }
        if let Some(sym) = &self.symbol {
            out.push_str(sym);
        }
        out.push_str(&digits);
        out.push_str(suffix);
        out
    }

    /// Sub-unit amounts get 4 to 6 fraction digits, everything else exactly 2.
    pub fn currency(&self, value: Decimal) -> String {
        // Precision follows the magnitude, so a loss renders with the same
        // digits as a gain of the same size: -1234.5 is "-$1,234.50".
        let (min, max) = if value.abs() < Decimal::ONE { (4, 6) } else { (2, 2) };
        let (negative, digits) = render_abs(value, min, max);
        self.assemble(negative, &digits, "")
    }

    /// Abbreviate with T/B/M above a million, otherwise plain currency.
    pub fn market_cap(&self, value: Decimal) -> String {
        let (scale, suffix) = if value >= TRILLION {
            (TRILLION, "T")
        } else if value >= BILLION {
            (BILLION, "B")
        } else if value >= MILLION {
            (MILLION, "M")
        } else {
            return self.currency(value);
        };
        let (negative, digits) = render_abs(value / scale, 2, 2);
        self.assemble(negative, &digits, suffix)
    }
}

/// Percentage with exactly two decimals, e.g. `33.33%`.
pub fn format_percent(value: Decimal) -> String {
    let (negative, digits) = render_abs(value, 2, 2);
    let sign = if negative { "-" } else { "" };
    format!("{sign}{digits}%")
}

/// Quantity with six decimals.
pub fn format_quantity(value: Decimal) -> String {
    let (negative, digits) = render_abs(value, 6, 6);
    let sign = if negative { "-" } else { "" };
    format!("{sign}{digits}")
}

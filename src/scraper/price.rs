// price.rs
use regex::Regex;
use std::sync::OnceLock;

/// Optional currency symbol, ASCII digit groups with thousands separators, up to two decimals.
const PRICE_PATTERN: &str = r"[$€£]?\s*[0-9][0-9,]*(?:\.[0-9]{1,2})?";

fn price_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PRICE_PATTERN).ok()).as_ref()
}

/// True when the text carries something worth treating as a price:
/// a currency symbol or the word "free" in any case.
pub fn has_price_signal(text: &str) -> bool {
    text.contains(['$', '€', '£']) || text.to_lowercase().contains("free")
}

/// Best-effort conversion of marketplace price text into a number.
///
/// "FREE" and "free shipping" become `0.0`, "$1,234.50" becomes `1234.5`,
/// anything without a recognizable amount is `None`. Never fails.
pub fn normalize_price(text: Option<&str>) -> Option<f64> {
    let text = text?.trim();
    if text.is_empty() {
        return None;
    }

    let lowered = text.to_lowercase();
    if lowered.contains("free") {
        return Some(0.0);
    }

    let matched = price_regex()?.find(&lowered)?.as_str();
    let digits: String = matched
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | ',') && !c.is_whitespace())
        .collect();

    digits
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

use regex::Regex;
use std::sync::LazyLock;

/// Placeholder stored when a price label is missing from the page
pub const NOT_AVAILABLE: &str = "N/A";

static PRICE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\d,.]+").expect("price pattern is valid"));

/// A price label as displayed, together with its parsed amount
#[derive(Debug, Clone, PartialEq)]
pub struct PriceText {
    /// Verbatim label text, or [`NOT_AVAILABLE`]
    pub text: String,

    /// Parsed amount; `None` when the label holds no readable number
    pub value: Option<f64>,
}

impl PriceText {
    /// Wraps a label and parses its amount
    pub fn parse(text: impl Into<String>) -> Self {
        let text = text.into();
        let value = parse_price(&text);
        Self { text, value }
    }

    /// A price that was not shown on the page
    pub fn missing() -> Self {
        Self {
            text: NOT_AVAILABLE.to_string(),
            value: None,
        }
    }
}

/// Extracts a numeric amount from a price label
///
/// Takes the first run of digits, grouping commas and decimal points, drops
/// the commas and parses the longest leading decimal in what remains, so a
/// trailing full stop or a second point is ignored. Never fails: anything
/// unreadable yields `None`.
///
/// # Examples
///
/// ```
/// use catalog_sweep::record::parse_price;
///
/// assert_eq!(parse_price("$1,299.50 CAD"), Some(1299.5));
/// assert_eq!(parse_price("N/A"), None);
/// ```
pub fn parse_price(text: &str) -> Option<f64> {
    if text.is_empty() || text == NOT_AVAILABLE {
        return None;
    }

    let run = PRICE_RUN.find(text)?;
    let digits = run.as_str().replace(',', "");
    let number = leading_decimal(&digits);
    if !number.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }

    number.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Longest prefix of the form `\d*\.?\d*`
fn leading_decimal(digits: &str) -> &str {
    let mut seen_point = false;
    let end = digits
        .char_indices()
        .find(|&(_, c)| match c {
            '.' if !seen_point => {
                seen_point = true;
                false
            }
            c => !c.is_ascii_digit(),
        })
        .map_or(digits.len(), |(index, _)| index);

    &digits[..end]
}

/// Fraction of the list price saved by the sale price
///
/// Present only when both amounts are known and the list price is positive.
pub fn discount_fraction(list: Option<f64>, sale: Option<f64>) -> Option<f64> {
    match (list, sale) {
        (Some(list), Some(sale)) if list > 0.0 => Some((list - sale) / list),
        _ => None,
    }
}

// report-pdf: Numeric cell formatting

use std::borrow::Cow;

/// Switch a decimal point to the Russian decimal comma.
///
/// Only values that parse as a plain number are touched; everything else
/// (text, dates, ranges, empty cells) passes through unchanged.
pub fn localize_decimal(value: &str) -> Cow<'_, str> {
    if !value.contains('.') || !is_plain_number(value) {
        return Cow::Borrowed(value);
    }
    Cow::Owned(value.replacen('.', ",", 1))
}

fn is_plain_number(value: &str) -> bool {
    let compact: String = value
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '\u{00A0}'))
        .collect();
    let unsigned = compact.strip_prefix(['-', '+']).unwrap_or(&compact);

    let separators = unsigned.chars().filter(|c| matches!(c, '.' | ',')).count();
    let well_formed = !unsigned.is_empty()
        && separators <= 1
        && unsigned.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | ','))
        && unsigned.chars().next().is_some_and(|c| c.is_ascii_digit());

    well_formed && unsigned.replace(',', ".").parse::<f64>().is_ok()
}

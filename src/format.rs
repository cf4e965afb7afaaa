//! Display helpers for dollar amounts and percentages.

/// Whole dollars with thousands separators, e.g. `$12,345` or `-$800`.
pub fn format_currency(value: f64) -> String {
    money(value, 0, false)
}

/// Dollars and cents, e.g. `$1,234.50`.
pub fn format_currency_detailed(value: f64) -> String {
    money(value, 2, false)
}

/// Signed whole dollars, e.g. `+$500` or `-$500`.
pub fn format_diff(value: f64) -> String {
    money(value, 0, true)
}

/// Signed percentage with one decimal, e.g. `+12.5%`.
pub fn format_percent(value: f64) -> String {
    let value = if value.is_finite() && value != 0.0 { value } else { 0.0 };
    format!("{value:+.1}%")
}

fn money(value: f64, decimals: usize, signed: bool) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let digits = format!("{:.*}", decimals, value.abs());
    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (digits.as_str(), None),
    };

    let is_zero = digits.chars().all(|c| c == '0' || c == '.');
    let sign = if value < 0.0 && !is_zero {
        "-"
    } else if signed {
        "+"
    } else {
        ""
    };

    let mut output = format!("{sign}${}", group_thousands(whole));
    if let Some(fraction) = fraction {
        output.push('.');
        output.push_str(fraction);
    }
    output
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

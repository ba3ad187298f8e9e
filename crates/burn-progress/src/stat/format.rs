use super::{Number, Stat, Stats, TensorValue};

/// Precision of the general number format when none is given.
const GENERAL_PRECISION: usize = 6;

/// Format a number with the general format, keeping `precision` significant digits.
///
/// Trailing zeros are removed, and the scientific notation is used when the exponent is lower
/// than -4 or not lower than the precision, e.g. `0.0001`, `1e-05`, `123457` and `1.23457e+06`.
pub fn format_general(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let precision = precision.max(1);
    let scientific = format!("{:.*e}", precision - 1, value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    if exponent < -4 || exponent >= precision as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{sign}{:02}",
            trim_fraction(mantissa),
            exponent.unsigned_abs()
        )
    } else {
        let decimals = (precision as i32 - 1 - exponent) as usize;
        trim_fraction(&format!("{value:.decimals$}")).to_string()
    }
}

fn trim_fraction(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

/// Format a statistic for display.
///
/// * Numbers use the general format.
/// * Averaging meters show their average with 3 decimals.
/// * Rate meters show their average rounded to an integer.
/// * Stopwatch meters show their sum rounded to an integer.
/// * Tensor floats are rounded to 3 significant digits.
/// * Anything else is displayed as is.
pub fn format_stat(stat: &Stat) -> String {
    match stat {
        Stat::Number(number) => format_number(*number),
        Stat::Average(meter) => format!("{:.3}", meter.avg()),
        Stat::Time(meter) => format_general(meter.avg().round_ties_even(), GENERAL_PRECISION),
        Stat::Stopwatch(meter) => format_general(meter.sum().round_ties_even(), GENERAL_PRECISION),
        Stat::Tensor(value) => format_tensor(value),
        Stat::Other(value) => value.clone(),
    }
}

fn format_number(number: Number) -> String {
    format_general(number.to_f64(), GENERAL_PRECISION)
}

fn format_tensor(value: &TensorValue) -> String {
    match value {
        TensorValue::Float(value) => {
            let rounded = format_general(*value, 3).parse::<f64>().unwrap_or(*value);
            format_general(rounded, GENERAL_PRECISION)
        }
        TensorValue::Int(value) => value.to_string(),
        TensorValue::List(values) => {
            let values = values
                .iter()
                .map(|value| format!("{value:?}"))
                .collect::<Vec<_>>();
            format!("[{}]", values.join(", "))
        }
    }
}

/// Format every statistic of the record, keeping the display order.
pub fn format_stats(stats: &Stats) -> Vec<(String, String)> {
    stats
        .iter()
        .map(|(key, stat)| (key.to_string(), format_stat(stat)))
        .collect()
}

/// Render formatted statistics as `key=value, key=value`.
pub fn str_commas(stats: &[(String, String)]) -> String {
    stats
        .iter()
        .map(|(key, value)| format!("{key}={}", value.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render formatted statistics as `key value | key value`.
pub fn str_pipes(stats: &[(String, String)]) -> String {
    stats
        .iter()
        .map(|(key, value)| format!("{key} {}", value.trim()))
        .collect::<Vec<_>>()
        .join(" | ")
}

//! Scalar formatting and labelled data output

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use console::style;
use serde_json::Value;

use crate::formatting::FormatError;

/// Decimal places used by [`Fmt`] for floats
pub const FLOAT_PRECISION: usize = 4;

/// Decimal places floats are rounded to by [`data_print`]
pub const DATA_PRECISION: i32 = 5;

/// Short, fixed-width-friendly rendering of a scalar
pub trait Fmt {
    fn fmt_short(&self) -> String;
}

impl Fmt for f64 {
    fn fmt_short(&self) -> String {
        format!("{:.*}", FLOAT_PRECISION, self)
    }
}

impl Fmt for f32 {
    fn fmt_short(&self) -> String {
        f64::from(*self).fmt_short()
    }
}

impl<Tz: TimeZone> Fmt for DateTime<Tz>
where
    Tz::Offset: std::fmt::Display,
{
    fn fmt_short(&self) -> String {
        self.format("%Y-%m-%d").to_string()
    }
}

impl Fmt for NaiveDateTime {
    fn fmt_short(&self) -> String {
        self.format("%Y-%m-%d").to_string()
    }
}

impl Fmt for NaiveDate {
    fn fmt_short(&self) -> String {
        self.format("%Y-%m-%d").to_string()
    }
}

/// Format any [`Fmt`] value
pub fn fmt<T: Fmt + ?Sized>(value: &T) -> String {
    value.fmt_short()
}

/// Format a JSON scalar: floats to four places, RFC 3339 strings as dates.
///
/// Integers are not floats and are rejected like any other type.
pub fn fmt_value(value: &Value) -> Result<String, FormatError> {
    match value {
        Value::Number(n) if n.is_f64() => n
            .as_f64()
            .map(|f| f.fmt_short())
            .ok_or_else(|| FormatError::unsupported("fmt", value)),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.fmt_short())
            .map_err(|_| FormatError::unsupported("fmt", value)),
        other => Err(FormatError::unsupported("fmt", other)),
    }
}

fn round(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Render labelled values one per line, labels aligned.
///
/// Labels are styled yellow; float values are rounded to
/// [`DATA_PRECISION`] places, strings print without quotes.
pub fn data_print<L: AsRef<str>>(labeled_data: &[(L, Value)]) -> Vec<String> {
    let longest = labeled_data
        .iter()
        .map(|(label, _)| console::measure_text_width(label.as_ref()))
        .max()
        .unwrap_or(0);

    labeled_data
        .iter()
        .map(|(label, data)| {
            let label = label.as_ref();
            let padding = " ".repeat(longest + 1 - console::measure_text_width(label));
            let data = match data {
                Value::Number(n) if n.is_f64() => n
                    .as_f64()
                    .map(|f| round(f, DATA_PRECISION).to_string())
                    .unwrap_or_else(|| n.to_string()),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!("{}:{}{}", style(label).yellow(), padding, data)
        })
        .collect()
}

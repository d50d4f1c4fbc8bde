use crate::cleaning::error::TransformError;
use crate::cleaning::frame::string_values;
use chrono::NaiveDate;
use polars::prelude::*;

/// Parses a compact `YYYYMMDD` date code.
///
/// Codes stored in a float column render as `20240301.0`; the trailing `.0` is accepted.
///
/// # Examples
///
/// ```
/// use raindust::parse_compact_date;
/// use chrono::NaiveDate;
///
/// assert_eq!(parse_compact_date("20240301"), NaiveDate::from_ymd_opt(2024, 3, 1));
/// assert_eq!(parse_compact_date("20240231"), None);
/// ```
pub fn parse_compact_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let value = value.strip_suffix(".0").unwrap_or(value);
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y%m%d").ok()
}

/// Parses a sampling date written as `YYYY-MM-DD` or `DD/MM/YYYY`, optionally followed by a
/// time of day after a space or a `T`. The time part is ignored.
pub fn parse_sampling_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let (date, rest) = if value.is_char_boundary(10) && value.len() >= 10 {
        value.split_at(10)
    } else {
        return None;
    };
    if !(rest.is_empty() || rest.starts_with(' ') || rest.starts_with('T')) {
        return None;
    }
    ["%Y-%m-%d", "%d/%m/%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date, format).ok())
}

/// Replaces `column` by its parsed calendar date and drops the rows that do not parse.
///
/// A column already typed as a date is only filtered for nulls. Returns the table and the
/// number of dropped rows.
pub fn parse_date_column(
    df: &DataFrame,
    column: &str,
    parse: fn(&str) -> Option<NaiveDate>,
) -> Result<(DataFrame, usize), TransformError> {
    let mut df = df.clone();
    if df.column(column)?.dtype() != &DataType::Date {
        let text = string_values(&df, column)?;
        let dates = DateChunked::from_naive_date_options(
            column.into(),
            text.into_iter().map(|value| value.and_then(parse)),
        );
        df.with_column(dates.into_series())?;
    }

    let before = df.height();
    let keep = df.column(column)?.as_materialized_series().is_not_null();
    let df = df.filter(&keep)?;
    let dropped = before - df.height();
    Ok((df, dropped))
}

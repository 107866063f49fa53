use polars::prelude::*;

use crate::error::Result;

/// Coerces the declared numeric-looking columns to floats. Raw cells use a
/// comma decimal separator; anything unparseable becomes missing rather than
/// an error. Columns that are already floats pass through untouched, which
/// makes the stage idempotent.
pub fn normalize_numeric_columns(df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
    let mut output = df.clone();

    for name in columns {
        let dtype = output.column(name)?.dtype().clone();
        if dtype == DataType::Float64 {
            continue;
        }

        let series = if dtype == DataType::String {
            let raw = output.column(name)?.str()?;
            let mut parsed: Vec<Option<f64>> = Vec::with_capacity(raw.len());
            for idx in 0..raw.len() {
                parsed.push(raw.get(idx).and_then(parse_locale_float));
            }
            Series::new((*name).into(), parsed)
        } else {
            output
                .column(name)?
                .cast(&DataType::Float64)?
                .as_materialized_series()
                .clone()
        };

        output.with_column(series)?;
    }

    Ok(output)
}

/// Removes the named junk column if present; absence is not an error.
pub fn drop_junk_column(df: &DataFrame, name: &str) -> Result<DataFrame> {
    let present = df
        .get_column_names()
        .iter()
        .any(|column| column.as_str() == name);
    if present {
        Ok(df.drop(name)?)
    } else {
        Ok(df.clone())
    }
}

fn parse_locale_float(value: &str) -> Option<f64> {
    let cleaned = value.replace(',', ".");
    let trimmed = cleaned.trim();
    match trimmed.parse::<f64>() {
        // A textual NaN parses successfully but is still a missing value.
        Ok(parsed) if parsed.is_nan() => None,
        Ok(parsed) => Some(parsed),
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_decimals_parse_and_junk_text_degrades() {
        assert_eq!(parse_locale_float("12,5"), Some(12.5));
        assert_eq!(parse_locale_float(" 3.25 "), Some(3.25));
        assert_eq!(parse_locale_float("abc"), None);
        assert_eq!(parse_locale_float("NaN"), None);
    }
}

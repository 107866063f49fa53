use std::collections::HashMap;

use chrono::NaiveDateTime;
use polars::prelude::*;

use crate::error::Result;

const MINUTE_MICROS: i64 = 60 * 1_000_000;
const TEN_MINUTES: i64 = 10 * MINUTE_MICROS;
const TWENTY_MINUTES: i64 = 20 * MINUTE_MICROS;

/// Formats accepted by the general-purpose parsing attempt, tried in order.
static GENERAL_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

/// Explicit retry format for values the general attempt cannot read.
const FALLBACK_FORMAT: &str = "%m/%d/%Y %H:%M";

/// Cleans, parses, imputes and deduplicates the timestamp column.
///
/// After this stage every row's timestamp is either a valid datetime or
/// explicitly missing, duplicate timestamps are collapsed to their most
/// complete row, and all surviving rows sit in their original physical
/// order.
pub fn reconcile_timestamps(df: &DataFrame, column: &str) -> Result<DataFrame> {
    let parsed = parse_column(df, column)?;
    let resolved = impute_from_neighbors(&parsed);

    let mut output = df.clone();
    let series = Series::new(column.into(), resolved.clone())
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?;
    output.with_column(series)?;

    let keep = deduplicate_indices(&output, column, &resolved)?;
    let idx = IdxCa::from_vec("idx".into(), keep);
    Ok(output.take(&idx)?)
}

fn parse_column(df: &DataFrame, column: &str) -> Result<Vec<Option<i64>>> {
    let raw = df.column(column)?.cast(&DataType::String)?;
    let raw = raw.str()?;

    let mut parsed: Vec<Option<i64>> = Vec::with_capacity(raw.len());
    for idx in 0..raw.len() {
        let cleaned = raw.get(idx).and_then(clean_cell);
        parsed.push(cleaned.as_deref().and_then(parse_timestamp));
    }
    Ok(parsed)
}

/// Collapses embedded line breaks and tabs to single spaces and trims.
/// Empty strings and the literal text "nan" (any case) count as missing.
fn clean_cell(value: &str) -> Option<String> {
    let mut cleaned = String::with_capacity(value.len());
    let mut in_break = false;
    for c in value.chars() {
        if matches!(c, '\r' | '\n' | '\t') {
            if !in_break {
                cleaned.push(' ');
                in_break = true;
            }
        } else {
            cleaned.push(c);
            in_break = false;
        }
    }

    let trimmed = cleaned.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_timestamp(value: &str) -> Option<i64> {
    for format in GENERAL_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.and_utc().timestamp_micros());
        }
    }
    NaiveDateTime::parse_from_str(value, FALLBACK_FORMAT)
        .ok()
        .map(|dt| dt.and_utc().timestamp_micros())
}

/// Fills a missing timestamp from its immediate physical neighbors. The
/// neighbor values are read from the original parsed sequence, so one
/// imputed value never feeds the next. A row with any invalid neighbor is
/// intentionally left missing.
fn impute_from_neighbors(parsed: &[Option<i64>]) -> Vec<Option<i64>> {
    let mut resolved = parsed.to_vec();

    for idx in 0..parsed.len() {
        if parsed[idx].is_some() || idx == 0 || idx + 1 == parsed.len() {
            continue;
        }
        if let (Some(prev), Some(next)) = (parsed[idx - 1], parsed[idx + 1]) {
            if next - prev == TWENTY_MINUTES {
                resolved[idx] = Some(prev + TEN_MINUTES);
            } else {
                resolved[idx] = Some((prev + next) / 2);
            }
        }
    }

    resolved
}

/// Keeps, per distinct resolved timestamp, the row with the highest
/// completeness score (non-missing cells, timestamp excluded); ties go to
/// the earliest original position. Rows with a missing timestamp are never
/// deduplicated. The returned indices are ascending, restoring original
/// order.
fn deduplicate_indices(
    df: &DataFrame,
    timestamp_column: &str,
    resolved: &[Option<i64>],
) -> Result<Vec<IdxSize>> {
    let scores = completeness_scores(df, timestamp_column)?;

    let mut best: HashMap<i64, (usize, usize)> = HashMap::new();
    for (idx, value) in resolved.iter().enumerate() {
        let Some(ts) = value else {
            continue;
        };
        best.entry(*ts)
            .and_modify(|(best_idx, best_score)| {
                if scores[idx] > *best_score {
                    *best_idx = idx;
                    *best_score = scores[idx];
                }
            })
            .or_insert((idx, scores[idx]));
    }

    let mut keep = Vec::with_capacity(resolved.len());
    for (idx, value) in resolved.iter().enumerate() {
        let retained = match value {
            Some(ts) => best[ts].0 == idx,
            None => true,
        };
        if retained {
            keep.push(idx as IdxSize);
        }
    }
    Ok(keep)
}

fn completeness_scores(df: &DataFrame, timestamp_column: &str) -> Result<Vec<usize>> {
    let mut scores = vec![0usize; df.height()];
    for column in df.get_columns() {
        if column.name().as_str() == timestamp_column {
            continue;
        }
        let mask = column.as_materialized_series().is_not_null();
        for (idx, score) in scores.iter_mut().enumerate() {
            if mask.get(idx) == Some(true) {
                *score += 1;
            }
        }
    }
    Ok(scores)
}

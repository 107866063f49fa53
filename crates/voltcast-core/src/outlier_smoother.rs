use polars::prelude::*;

use crate::error::Result;
use crate::stats;

pub const DEFAULT_MEDIAN_WINDOW: usize = 25;

/// Replaces IQR outliers in every float column with a centered rolling
/// median over `window` rows, falling back to the column's overall median
/// where the window holds no valid observation.
///
/// Rows are stable-sorted by the timestamp column first (missing timestamps
/// last) because the rolling window relies on temporal adjacency. The
/// earlier neighbor-imputation step instead trusts the physical row order
/// as-is; the two ordering assumptions are deliberately kept independent.
pub fn smooth_outliers(df: &DataFrame, timestamp_column: &str, window: usize) -> Result<DataFrame> {
    let mut output = sort_by_timestamp(df, timestamp_column)?;

    let names: Vec<String> = output
        .get_columns()
        .iter()
        .filter(|column| column.dtype() == &DataType::Float64)
        .map(|column| column.name().to_string())
        .collect();

    for name in names {
        let smoothed = {
            let values = output.column(&name)?.f64()?;
            let cells: Vec<Option<f64>> = (0..values.len()).map(|idx| values.get(idx)).collect();
            let Some(replaced) = replace_outliers(&cells, window) else {
                continue;
            };
            Series::new(name.as_str().into(), replaced)
        };
        output.with_column(smoothed)?;
    }

    Ok(output)
}

fn sort_by_timestamp(df: &DataFrame, timestamp_column: &str) -> Result<DataFrame> {
    let timestamps = df.column(timestamp_column)?.datetime()?;
    let mut order: Vec<IdxSize> = (0..df.height() as IdxSize).collect();
    order.sort_by_key(|&idx| match timestamps.get(idx as usize) {
        Some(value) => (false, value),
        None => (true, 0),
    });

    let idx = IdxCa::from_vec("idx".into(), order);
    Ok(df.take(&idx)?)
}

/// Returns the column with out-of-bounds cells replaced, or `None` when the
/// column has no usable quartiles or no outliers to replace.
fn replace_outliers(cells: &[Option<f64>], window: usize) -> Option<Vec<Option<f64>>> {
    let present: Vec<f64> = cells.iter().flatten().copied().collect();
    let q1 = stats::quantile(&present, 0.25)?;
    let q3 = stats::quantile(&present, 0.75)?;
    let iqr = q3 - q1;
    let low = q1 - 1.5 * iqr;
    let high = q3 + 1.5 * iqr;

    let flagged: Vec<usize> = cells
        .iter()
        .enumerate()
        .filter_map(|(idx, cell)| match cell {
            Some(value) if *value < low || *value > high => Some(idx),
            _ => None,
        })
        .collect();
    if flagged.is_empty() {
        return None;
    }

    let overall_median = stats::median(&present);
    let mut replaced = cells.to_vec();
    for idx in flagged {
        let rolling = rolling_median_at(cells, idx, window);
        replaced[idx] = rolling.or(overall_median);
    }
    Some(replaced)
}

/// Median of the centered window around `idx`, requiring at least one valid
/// observation. The window is computed over the pre-replacement cells so
/// one smoothed outlier never feeds another's window.
fn rolling_median_at(cells: &[Option<f64>], idx: usize, window: usize) -> Option<f64> {
    let left = (window.saturating_sub(1)) / 2;
    let right = window / 2;
    let start = idx.saturating_sub(left);
    let end = (idx + right).min(cells.len().saturating_sub(1));

    let neighborhood: Vec<f64> = cells[start..=end].iter().flatten().copied().collect();
    stats::median(&neighborhood)
}

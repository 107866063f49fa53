use polars::prelude::*;

use crate::error::Result;
use crate::stats;

/// Fills missing values in every float column with that column's median,
/// computed over the current table. Selection is by runtime type, so any
/// column that is numeric at this point (targets included) is imputable.
pub fn impute_numeric_medians(df: &DataFrame) -> Result<DataFrame> {
    let mut output = df.clone();

    let names: Vec<String> = output
        .get_columns()
        .iter()
        .filter(|column| column.dtype() == &DataType::Float64)
        .map(|column| column.name().to_string())
        .collect();

    for name in names {
        let filled = {
            let values = output.column(&name)?.f64()?;
            if values.null_count() == 0 {
                continue;
            }

            let present: Vec<f64> = values.into_iter().flatten().collect();
            let Some(median) = stats::median(&present) else {
                // Entirely missing column; nothing to impute from. The
                // drop-gates downstream handle whatever remains.
                continue;
            };

            let cells: Vec<f64> = (0..values.len())
                .map(|idx| values.get(idx).unwrap_or(median))
                .collect();
            Series::new(name.as_str().into(), cells)
        };
        output.with_column(filled)?;
    }

    Ok(output)
}

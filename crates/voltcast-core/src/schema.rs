use once_cell::sync::Lazy;
use polars::prelude::DataFrame;

use crate::error::{PipelineError, Result};

/// Declared role of a source column. "Numeric" covers the raw weather
/// readings; "Target" columns are numeric too but are kept out of the model's
/// feature set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Timestamp,
    Numeric,
    Target,
    Junk,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
}

pub const TIMESTAMP_COLUMN: &str = "DateTime";
pub const JUNK_COLUMN: &str = "mixed_type_col";

/// Source layout by position. The junk column is optional and, when present,
/// trails the declared columns.
static SOURCE_COLUMNS: Lazy<Vec<ColumnSpec>> = Lazy::new(|| {
    vec![
        ColumnSpec {
            name: TIMESTAMP_COLUMN,
            kind: ColumnKind::Timestamp,
        },
        ColumnSpec {
            name: "Temperature",
            kind: ColumnKind::Numeric,
        },
        ColumnSpec {
            name: "Humidity",
            kind: ColumnKind::Numeric,
        },
        ColumnSpec {
            name: "WindSpeed",
            kind: ColumnKind::Numeric,
        },
        ColumnSpec {
            name: "GeneralDiffuseFlows",
            kind: ColumnKind::Numeric,
        },
        ColumnSpec {
            name: "DiffuseFlows",
            kind: ColumnKind::Numeric,
        },
        ColumnSpec {
            name: "PowerConsumption_Zone1",
            kind: ColumnKind::Target,
        },
        ColumnSpec {
            name: "PowerConsumption_Zone2",
            kind: ColumnKind::Target,
        },
        ColumnSpec {
            name: "PowerConsumption_Zone3",
            kind: ColumnKind::Target,
        },
        ColumnSpec {
            name: JUNK_COLUMN,
            kind: ColumnKind::Junk,
        },
    ]
});

/// Feature columns the trained model consumes, in the exact order the
/// prediction side must assemble them. Any deviation here silently corrupts
/// predictions because the regressor reads feature vectors positionally.
pub const FEATURE_ORDER: [&str; 12] = [
    "Temperature",
    "Humidity",
    "WindSpeed",
    "GeneralDiffuseFlows",
    "DiffuseFlows",
    "Day",
    "Month",
    "Hour",
    "Minute",
    "DayWeek",
    "QuarterYear",
    "DayYear",
];

pub const CALENDAR_COLUMNS: [&str; 7] = [
    "Day",
    "Month",
    "Hour",
    "Minute",
    "DayWeek",
    "QuarterYear",
    "DayYear",
];

pub fn source_columns() -> &'static [ColumnSpec] {
    SOURCE_COLUMNS.as_slice()
}

/// The declared numeric-looking columns: the eight columns after the first,
/// by position, in the source layout.
pub fn numeric_columns() -> Vec<&'static str> {
    SOURCE_COLUMNS
        .iter()
        .filter(|spec| matches!(spec.kind, ColumnKind::Numeric | ColumnKind::Target))
        .map(|spec| spec.name)
        .collect()
}

pub fn weather_columns() -> Vec<&'static str> {
    SOURCE_COLUMNS
        .iter()
        .filter(|spec| spec.kind == ColumnKind::Numeric)
        .map(|spec| spec.name)
        .collect()
}

pub fn target_columns() -> Vec<&'static str> {
    SOURCE_COLUMNS
        .iter()
        .filter(|spec| spec.kind == ColumnKind::Target)
        .map(|spec| spec.name)
        .collect()
}

/// Column names of the processed table with the timestamp column removed:
/// the eight numeric columns followed by the seven derived calendar columns.
pub fn processed_columns() -> Vec<&'static str> {
    let mut names = numeric_columns();
    names.extend_from_slice(&CALENDAR_COLUMNS);
    names
}

fn required_width() -> usize {
    SOURCE_COLUMNS
        .iter()
        .filter(|spec| spec.kind != ColumnKind::Junk)
        .count()
}

fn full_width() -> usize {
    SOURCE_COLUMNS.len()
}

/// Validates the source column count once at load time and reports whether
/// the trailing junk column is present. A mismatched count fails fast instead
/// of silently misaligning the positional mapping.
pub fn validate_source_width(found: usize) -> Result<bool> {
    let required = required_width();
    let full = full_width();
    if found == required {
        Ok(false)
    } else if found == full {
        Ok(true)
    } else {
        Err(PipelineError::ColumnCount {
            expected_min: required,
            expected_max: full,
            found,
        })
    }
}

/// Fail-fast presence check for a required column.
pub fn require_column(df: &DataFrame, column: &str) -> Result<()> {
    if df
        .get_column_names()
        .iter()
        .any(|name| name.as_str() == column)
    {
        Ok(())
    } else {
        Err(PipelineError::MissingColumn {
            column: column.to_string(),
        })
    }
}
